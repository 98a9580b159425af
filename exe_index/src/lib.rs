#[macro_export]
macro_rules! generate_index_type {
    ($struct_name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
        pub struct $struct_name(u32);

        impl $struct_name {
            pub const ZERO: $struct_name = $struct_name(0);

            pub fn new(id: usize) -> Self {
                $struct_name(id as u32)
            }

            pub fn inner(&self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Slot of an entity inside the lookup table
generate_index_type!(EntityID);
