use crate::domain::ports::Authorizer;

/// Fixed permissions, typically taken from the `[access]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthorizer {
    read: bool,
    write: bool,
}

impl StaticAuthorizer {
    pub fn new(read: bool, write: bool) -> Self {
        Self { read, write }
    }

    pub fn admin() -> Self {
        Self::new(true, true)
    }

    pub fn read_only() -> Self {
        Self::new(true, false)
    }

    pub fn deny_all() -> Self {
        Self::new(false, false)
    }
}

impl Authorizer for StaticAuthorizer {
    fn can_read(&self) -> bool {
        self.read
    }

    fn can_write(&self) -> bool {
        self.write
    }
}
