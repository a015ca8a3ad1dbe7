//! Reading and writing the serialized work-unit artifacts.

pub mod serialization;
