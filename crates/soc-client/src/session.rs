use soc_core::AuthGrant;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionGate {
    logged_in: bool,
    token: String,
    permissions: HashMap<String, bool>,
    verifying: bool,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, grant: AuthGrant) {
        self.logged_in = true;
        self.token = grant.token;
        self.permissions = grant.permissions;
    }

    pub fn clear(&mut self) {
        self.logged_in = false;
        self.token.clear();
        self.permissions.clear();
    }

    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn bearer(&self) -> Option<&str> {
        if self.logged_in && !self.token.is_empty() {
            Some(&self.token)
        } else {
            None
        }
    }

    pub fn allowed(&self, permission: &str) -> bool {
        self.permissions.get(permission).copied().unwrap_or(false)
    }

    pub fn permissions(&self) -> &HashMap<String, bool> {
        &self.permissions
    }

    pub fn begin_verify(&mut self) -> bool {
        if self.verifying || self.logged_in {
            return false;
        }
        self.verifying = true;
        true
    }

    pub fn end_verify(&mut self) {
        self.verifying = false;
    }

    pub fn verifying(&self) -> bool {
        self.verifying
    }
}
