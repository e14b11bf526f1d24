mod field_assembler;
pub mod verhoeff_checksum;

pub use field_assembler::{keep_digits, AssembledFields, FieldAssembler};
pub use verhoeff_checksum::ChecksumError;
