use actix_web::web;

pub mod health;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .configure(users::configure_routes);
}
