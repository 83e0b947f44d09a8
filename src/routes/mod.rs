use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, carwash, client, driver, notifications};
use crate::middleware::auth::{
    auth_middleware, require_admin, require_carwash, require_client, require_driver,
};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Create role-specific governor layers
    let client_governor = create_role_governor(RateLimitedRole::Client);
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let carwash_governor = create_role_governor(RateLimitedRole::Carwash);
    // Create IP-based governor for public routes (with client-level limits)
    let public_governor = create_public_governor();

    // Public routes (with client-level rate limiting per IP)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public marketplace routes (browse car washes and their services)
    let public_routes = Router::new()
        .route("/carwashes", get(client::list_car_washes))
        .route("/carwashes/{id}/services", get(client::list_car_wash_services))
        .layer(public_governor);

    // Client routes (requires auth + client role)
    let client_routes = Router::new()
        // Vehicles
        .route("/vehicles", post(client::create_vehicle))
        .route("/vehicles", get(client::my_vehicles))
        .route("/vehicles/{id}", delete(client::delete_vehicle))
        // Bookings
        .route("/bookings", post(client::create_booking))
        .route("/bookings", get(client::my_bookings))
        .route("/bookings/{id}", get(client::get_booking))
        .route("/bookings/{id}/cancel", post(client::cancel_booking))
        .route("/bookings/{id}/pay", post(client::pay_booking))
        .route("/bookings/{id}/confirm", post(client::confirm_completion))
        .layer(client_governor)
        .layer(middleware::from_fn(require_client))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver routes (requires auth + driver role)
    let driver_routes = Router::new()
        .route("/bookings/available", get(driver::available_bookings))
        .route("/bookings", get(driver::my_bookings))
        .route("/bookings/{id}/accept", post(driver::accept_booking))
        .route("/bookings/{id}/decline", post(driver::decline_booking))
        .route("/bookings/{id}/pickup", post(driver::confirm_pickup))
        .route("/bookings/{id}/deliver", post(driver::confirm_delivery))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Car wash routes (requires auth + carwash role)
    let carwash_routes = Router::new()
        // Service management
        .route("/services", get(carwash::my_services))
        .route("/services", post(carwash::create_service))
        .route("/services/{id}", put(carwash::update_service))
        .route("/services/{id}", delete(carwash::delete_service))
        // Bookings
        .route("/bookings", get(carwash::my_bookings))
        .route("/bookings/{id}/status", put(carwash::update_booking_status))
        // Reporting
        .route("/dashboard", get(carwash::dashboard))
        .layer(carwash_governor)
        .layer(middleware::from_fn(require_carwash))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role; no per-user rate limit)
    let admin_routes = Router::new()
        // User management
        .route("/users", get(admin::list_all_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/drivers", get(admin::list_drivers))
        // Booking oversight
        .route("/bookings", get(admin::list_all_bookings))
        .route("/bookings/{id}/status", put(admin::update_booking_status))
        // Payments
        .route("/payments", get(admin::list_payments))
        .route("/payments/{id}/refund", post(admin::refund_payment))
        // Reporting
        .route("/dashboard", get(admin::dashboard))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Notification routes (any authenticated role)
    let notification_routes = Router::new()
        .route("/", get(notifications::my_notifications))
        .route("/{id}/read", post(notifications::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/client", client_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/carwash", carwash_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/notifications", notification_routes)
        .with_state(state)
}
