/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: HS256 access/refresh tokens
/// - [`middleware`]: bearer-token validation and the `AuthContext` extractor
/// - [`authorization`]: the Access Guard for project-scoped roles
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use teamboard_shared::auth::middleware::authenticate_bearer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "an-hs256-secret-of-at-least-32-bytes!";
/// let user_id = Uuid::new_v4();
///
/// let token = create_token(&Claims::new(user_id, TokenType::Access), secret)?;
/// let auth = authenticate_bearer(Some(&format!("Bearer {}", token)), secret)?;
/// assert_eq!(auth.user_id, user_id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
