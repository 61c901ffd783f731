//! Enumerated type operations

#[derive(Debug, Clone, PartialEq)]
pub enum EnumTypeOperation {
    Create { name: String, choices: Vec<String> },
    Drop { name: String },
    Rename { name: String, new_name: String },
    AddValue { name: String, value: String },
}
