use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use exe_driver::BuildOptions;
use exe_table::EntityOrder;

/// Pack a CODE, CONF and DATA source directory into a .EXE image
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Source directory holding CODE, CONF and DATA
    pub path: PathBuf,
    /// Output image
    #[arg(short, long, default_value = BuildOptions::DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Order in which data entities are given addresses
    #[arg(long, value_enum, default_value_t = Order::Sorted)]
    pub order: Order,
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Order {
    /// By file name
    Sorted,
    /// As returned by the directory listing
    Listing,
}

impl From<Order> for EntityOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::Sorted => EntityOrder::Sorted,
            Order::Listing => EntityOrder::Listing,
        }
    }
}

impl Cli {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            source: self.path.clone(),
            output: self.output.clone(),
            order: self.order.into(),
        }
    }
}
