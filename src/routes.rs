use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

use crate::{api, auth::handlers, config::Config};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Owner surface
    cfg.service(
        web::scope("/owner")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::owner_login)),
            )
            .service(
                web::resource("/tenant").route(web::post().to(api::owner::create_tenant)),
            )
            .service(web::resource("/tenants").route(web::get().to(api::owner::list_tenants)))
            .service(
                web::resource("/tenants/user")
                    .route(web::post().to(api::owner::create_tenant_user)),
            )
            .service(web::resource("/tenant/{id}").route(web::get().to(api::owner::get_tenant)))
            .service(
                web::resource("/tenant/{id}/activate")
                    .route(web::put().to(api::owner::activate_tenant)),
            )
            .service(
                web::resource("/tenant/{id}/deactivate")
                    .route(web::put().to(api::owner::deactivate_tenant)),
            )
            .service(
                web::resource("/tenant/{tenant_id}/users")
                    .route(web::get().to(api::owner::list_tenant_users)),
            )
            .service(
                web::resource("/tenant/{tenant_id}/user/{id}")
                    .route(web::get().to(api::owner::get_tenant_user)),
            )
            .service(
                web::resource("/tenant/{tenant_id}/user/{id}/activate")
                    .route(web::put().to(api::owner::activate_tenant_user)),
            )
            .service(
                web::resource("/tenant/{tenant_id}/user/{id}/deactivate")
                    .route(web::put().to(api::owner::deactivate_tenant_user)),
            ),
    );

    // Admin surface
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::admin_login)),
            )
            .service(web::resource("/logout").route(web::post().to(handlers::admin_logout)))
            .service(web::resource("/me").route(web::get().to(api::admin::get_me)))
            .service(
                web::scope("/tenant")
                    .service(
                        web::resource("/employee")
                            .route(web::post().to(api::admin::create_employee)),
                    )
                    .service(
                        web::resource("/employees")
                            .route(web::get().to(api::admin::list_employees)),
                    )
                    .service(
                        web::resource("/employee/{id}")
                            .route(web::get().to(api::admin::get_employee)),
                    )
                    .service(
                        web::resource("/employee/{id}/activate")
                            .route(web::put().to(api::admin::activate_employee)),
                    )
                    .service(
                        web::resource("/employee/{id}/deactivate")
                            .route(web::put().to(api::admin::deactivate_employee)),
                    )
                    .service(
                        web::resource("/employee/{id}/idtoken")
                            .route(web::post().to(api::admin::issue_login_token)),
                    )
                    .service(
                        web::resource("/employee/{id}/session")
                            .route(web::delete().to(api::admin::clear_employee_session)),
                    )
                    .service(
                        web::resource("/employee/{id}/attendance")
                            .route(web::get().to(api::admin::attendance_by_date)),
                    )
                    .service(
                        web::resource("/employee/{id}/attendance/card")
                            .route(web::get().to(api::admin::attendance_card)),
                    )
                    .service(
                        web::resource("/geomarking")
                            .route(web::post().to(api::admin::create_geo_marking))
                            .route(web::get().to(api::admin::list_geo_markings)),
                    )
                    .service(
                        web::resource("/geomarking/{id}")
                            .route(web::get().to(api::admin::get_geo_marking))
                            .route(web::put().to(api::admin::update_geo_marking)),
                    ),
            ),
    );

    // Employee surface: link-token exchange plus the session-guarded routes
    cfg.service(
        web::resource("/e/t/{token}")
            .wrap(login_limiter)
            .route(web::get().to(api::employee::employee_login)),
    );
    cfg.service(
        web::scope("/employee")
            .wrap(protected_limiter)
            .service(web::resource("/me").route(web::get().to(api::employee::get_me)))
            .service(web::resource("/markin").route(web::post().to(api::employee::mark_in)))
            .service(web::resource("/markout").route(web::post().to(api::employee::mark_out))),
    );
}

// ADMIN ISSUES LINK
//  └─ POST /admin/tenant/employee/{id}/idtoken → login token (minutes)
//
// EMPLOYEE OPENS LINK (mobile)
//  └─ GET /e/t/{token}
//       ├─ act_employee (access, short-lived)
//       └─ rft_employee (refresh, days)
//
// ACCESS EXPIRED
//  └─ next request rotates via rft_employee, cookie re-set in response
