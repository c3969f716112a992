//! bcrypt password hashing. Existing databases already hold `$2a$`/`$2b$`
//! hashes, so bcrypt stays the storage format.

/// Hash a plaintext password with the given bcrypt cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a plaintext password against a stored hash.
///
/// A stored value that is not a bcrypt hash never matches; such rows must be
/// converted with `gestion migrate-passwords` first.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    if !is_hashed(hash) {
        return Ok(false);
    }
    bcrypt::verify(password, hash)
}

pub fn is_hashed(value: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|prefix| value.starts_with(prefix))
}

/// Hash on the blocking pool so the runtime keeps serving requests
pub async fn hash_password_blocking(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password_blocking(password: String, hash: String) -> anyhow::Result<bool> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await??;
    Ok(ok)
}
