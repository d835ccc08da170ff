use std::fmt;

/// Identifies one fixed-size block of a named file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    file_name: String,
    number: u64,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, number: u64) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Block with the same file name and a different number.
    pub fn with_number(&self, number: u64) -> Self {
        Self {
            file_name: self.file_name.clone(),
            number,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality() {
        assert_eq!(BlockId::new("a.log", 1), BlockId::new("a.log", 1));
        assert_ne!(BlockId::new("a.log", 1), BlockId::new("a.log", 2));
        assert_ne!(BlockId::new("a.log", 1), BlockId::new("b.log", 1));
    }

    #[test]
    fn test_hash_and_with_number() {
        let block = BlockId::new("a.log", 4);
        let mut set = HashSet::new();
        set.insert(block.clone());
        set.insert(block.with_number(3));
        set.insert(BlockId::new("a.log", 4));

        assert_eq!(set.len(), 2);
        assert_eq!(block.with_number(3).file_name(), "a.log");
        assert_eq!(block.with_number(3).number(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(BlockId::new("a.log", 7).to_string(), "[file a.log, block 7]");
    }
}
