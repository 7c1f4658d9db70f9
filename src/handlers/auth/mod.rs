mod login;
mod me;
mod refresh;
mod register;

pub use login::login_post;
pub use me::me_get;
pub use refresh::refresh_post;
pub use register::register_post;
