use actix_web::web;
use sqlx::PgPool;

use crate::config::Config;
use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig, pool: PgPool, config: Config) {
    cfg.app_data(web::Data::new(pool))
        .app_data(web::Data::new(config))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/polls")
                        .route(web::get().to(handlers::polls::list))
                        .route(web::post().to(handlers::polls::create)),
                )
                .service(
                    web::resource("/polls/{poll_id}")
                        .route(web::get().to(handlers::polls::detail))
                        .route(web::put().to(handlers::polls::update))
                        .route(web::delete().to(handlers::polls::delete)),
                )
                .service(
                    web::resource("/polls/{poll_id}/responses")
                        .route(web::post().to(handlers::votes::create)),
                )
                .service(
                    web::resource("/polls/{poll_id}/results")
                        .route(web::get().to(handlers::results::grouped)),
                )
                .service(
                    web::resource("/polls/{poll_id}/region-stats")
                        .route(web::get().to(handlers::results::region_stats)),
                )
                .service(
                    web::resource("/polls/{poll_id}/demographics")
                        .route(web::get().to(handlers::results::demographics)),
                )
                .service(
                    web::resource("/polls/{poll_id}/comments")
                        .route(web::get().to(handlers::comments::list))
                        .route(web::post().to(handlers::comments::create)),
                ),
        );
}
