pub mod auth;
pub mod barcode;
pub mod export;
pub mod product;
pub mod session;
pub mod stock_intake;
pub mod user;

pub use auth::AuthService;
pub use product::ProductService;
pub use session::SessionService;
pub use stock_intake::StockIntakeService;
pub use user::UserService;
