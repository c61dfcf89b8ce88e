use crate::{
    api::{attendance, audit, balance, holiday, leave_request, notification},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(web::resource("/users").route(web::post().to(handlers::create_user)))
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // before /{id} so the literals win
                    .service(web::resource("/summary").route(web::get().to(leave_request::leave_summary)))
                    .service(web::resource("/calendar").route(web::get().to(leave_request::leave_calendar)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::edit_leave))
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    .service(
                        web::resource("/{id}/attachment")
                            .route(web::put().to(leave_request::attach_leave)),
                    )
                    .service(
                        web::resource("/{id}/withdraw")
                            .route(web::put().to(leave_request::withdraw_leave)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/balance")
                    .service(web::resource("").route(web::get().to(balance::my_balance)))
                    .service(web::resource("/all").route(web::get().to(balance::all_balances)))
                    .service(web::resource("/init").route(web::post().to(balance::init_year)))
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(balance::user_balance))
                            .route(web::put().to(balance::set_balance)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(web::resource("/national").route(web::post().to(holiday::seed_national)))
                    .service(web::resource("/year/{year}").route(web::get().to(holiday::holidays_for_year)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(holiday::update_holiday))
                            .route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(notification::list_notifications))
                            .route(web::delete().to(notification::delete_all)),
                    )
                    .service(web::resource("/count").route(web::get().to(notification::unread_count)))
                    .service(web::resource("/read-all").route(web::put().to(notification::mark_all_read)))
                    .service(web::resource("/{id}/read").route(web::put().to(notification::mark_read)))
                    .service(
                        web::resource("/{id}").route(web::delete().to(notification::delete_notification)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::put().to(attendance::check_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/month").route(web::get().to(attendance::month)))
                    .service(web::resource("/manual").route(web::put().to(attendance::set_manual))),
            )
            .service(web::resource("/audit").route(web::get().to(audit::list_audit))),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token
