//! Sequence operations

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOperation {
    Create { name: String },
    Drop { name: String },
    Rename { name: String, new_name: String },
}
