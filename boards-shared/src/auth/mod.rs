/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: Session JWT generation and validation
/// - [`tokens`]: Opaque emailed tokens for signup requests, invitations and
///   password resets
/// - [`middleware`]: Request principal extraction from bearer tokens
/// - [`authorization`]: Board, collaborator and request permission rules
///
/// # Example
///
/// ```no_run
/// use boards_shared::auth::password::{hash_password, verify_password};
/// use boards_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("MyP@ssw0rd!")?;
/// assert!(verify_password("MyP@ssw0rd!", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4(), "juan"), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod tokens;
