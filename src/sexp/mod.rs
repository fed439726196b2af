//! Host value taxonomy and classification

pub mod raw;
pub mod types;

pub use raw::{
    classify, full_type, full_type_to_number_string, full_type_to_string, RawPromise, RawValue,
};
pub use types::SexpType;
