use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/books")
                        .service(web::resource("").route(web::get().to(handlers::get_all_books)))
                        .service(
                            web::resource("/search").route(web::get().to(handlers::search_books)),
                        )
                        .service(
                            web::resource("/count").route(web::get().to(handlers::count_books)),
                        )
                        .service(
                            web::resource("/exists").route(web::get().to(handlers::book_exists)),
                        ),
                )
                .service(
                    web::scope("/book")
                        .service(
                            web::resource("")
                                .route(web::post().to(handlers::add_book))
                                .route(web::put().to(handlers::update_book)),
                        )
                        .service(
                            web::scope("/{book_id}")
                                .service(
                                    web::resource("")
                                        .route(web::get().to(handlers::get_book))
                                        .route(web::delete().to(handlers::delete_book)),
                                )
                                .service(
                                    web::resource("/specimens")
                                        .route(web::get().to(handlers::get_specimens_for_book)),
                                )
                                .service(
                                    web::resource("/specimens/count")
                                        .route(web::get().to(handlers::count_specimens_for_book)),
                                ),
                        ),
                )
                .service(
                    web::scope("/specimen")
                        .service(web::resource("").route(web::post().to(handlers::add_specimen)))
                        .service(
                            web::scope("/{specimen_id}")
                                .service(
                                    web::resource("")
                                        .route(web::get().to(handlers::get_specimen))
                                        .route(web::delete().to(handlers::delete_specimen)),
                                )
                                .service(
                                    web::resource("/available")
                                        .route(web::put().to(handlers::mark_specimen_available)),
                                )
                                .service(
                                    web::resource("/rented")
                                        .route(web::put().to(handlers::mark_specimen_rented)),
                                )
                                .service(
                                    web::resource("/lost")
                                        .route(web::put().to(handlers::mark_specimen_lost)),
                                ),
                        ),
                )
                .service(
                    web::scope("/users")
                        .service(web::resource("").route(web::get().to(handlers::get_users)))
                        .service(
                            web::resource("/search").route(web::get().to(handlers::search_users)),
                        )
                        .service(
                            web::resource("/count").route(web::get().to(handlers::count_users)),
                        )
                        .service(
                            web::resource("/exists").route(web::get().to(handlers::user_exists)),
                        )
                        .service(
                            web::resource("/email/{email}")
                                .route(web::get().to(handlers::get_user_by_email)),
                        ),
                )
                .service(
                    web::scope("/user")
                        .service(
                            web::resource("")
                                .route(web::post().to(handlers::add_user))
                                .route(web::put().to(handlers::update_user)),
                        )
                        .service(
                            web::resource("/{user_id}")
                                .route(web::get().to(handlers::get_user))
                                .route(web::delete().to(handlers::delete_user)),
                        ),
                ),
        );
}
