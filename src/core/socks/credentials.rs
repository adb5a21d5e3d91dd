// src/core/socks/credentials.rs

/// The single login/password pair the gateway accepts.
#[derive(Clone)]
pub struct StaticCredentials {
    login: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Checks a presented pair. Both halves are always compared so the timing
    /// does not reveal which one was wrong.
    pub fn verify(&self, login: &str, password: &str) -> bool {
        let login_ok = constant_time_eq(login.as_bytes(), self.login.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        login_ok & password_ok
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
