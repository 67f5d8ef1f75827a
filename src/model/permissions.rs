//! Domain-scoped read/write permissions.
//!
//! Handlers that touch a named slice of state carry a permission value for
//! it and check before reading or writing. Violations surface to the
//! dispatch caller as [`Error::Permission`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type DomainName = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPermissions {
    pub domain: DomainName,
    pub read: bool,
    pub write: bool,
}

impl DomainPermissions {
    pub fn new(domain: impl Into<DomainName>, read: bool, write: bool) -> Self {
        Self {
            domain: domain.into(),
            read,
            write,
        }
    }

    pub fn read_only(domain: impl Into<DomainName>) -> Self {
        Self::new(domain, true, false)
    }

    pub fn read_write(domain: impl Into<DomainName>) -> Self {
        Self::new(domain, true, true)
    }

    /// Fails unless these permissions target `domain` and allow reads.
    pub fn check_read(&self, domain: &str) -> Result<()> {
        self.check_domain(domain)?;
        if !self.read {
            return Err(Error::Permission {
                domain: domain.to_string(),
                reason: "read is not allowed".to_string(),
            });
        }
        Ok(())
    }

    /// Fails unless these permissions target `domain` and allow writes.
    pub fn check_write(&self, domain: &str) -> Result<()> {
        self.check_domain(domain)?;
        if !self.write {
            return Err(Error::Permission {
                domain: domain.to_string(),
                reason: "write is not allowed".to_string(),
            });
        }
        Ok(())
    }

    fn check_domain(&self, domain: &str) -> Result<()> {
        if self.domain != domain {
            return Err(Error::Permission {
                domain: domain.to_string(),
                reason: format!("permissions were issued for {}", self.domain),
            });
        }
        Ok(())
    }
}
