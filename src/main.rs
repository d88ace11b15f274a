// Stagedoor API Server

use tokio::net::TcpListener;

use stagedoor::api::create_router;
use stagedoor::app_state::AppState;
use stagedoor::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.server_address();

    // Initialize application state
    let app_state = AppState::new(config).await?;

    // Build application router
    let app = create_router(app_state);

    // Start server
    println!("🎸 Stagedoor server starting on http://{}", addr);
    println!("📋 API routes:");
    println!("  POST   /api/auth/register            - Create account");
    println!("  POST   /api/auth/login               - Log in");
    println!("  GET    /api/auth/me                  - Current account");
    println!("  PUT    /api/users/profile            - Update profile");
    println!("  GET    /api/users/{{username}}         - Public profile");
    println!("  POST   /api/users/{{id}}/follow        - Follow");
    println!("  DELETE /api/users/{{id}}/follow        - Unfollow");
    println!("  GET    /api/users/{{id}}/followers     - Followers");
    println!("  GET    /api/users/{{id}}/following     - Following");
    println!("  POST   /api/posts                    - Create post");
    println!("  GET    /api/posts/feed               - Personalized feed");
    println!("  GET    /api/posts/user/{{username}}    - Posts by author");
    println!("  GET    /api/posts/{{id}}               - Get post");
    println!("  DELETE /api/posts/{{id}}               - Delete post");
    println!("  POST   /api/posts/{{id}}/like          - Toggle like");
    println!("  POST   /api/posts/{{id}}/comments      - Add comment");
    println!("  GET    /api/posts/{{id}}/comments      - List comments");
    println!("  POST   /api/media/upload             - Upload media");
    println!("  POST   /api/media/profile-picture    - Upload avatar");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
