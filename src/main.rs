// src/main.rs

mod app_state;
mod config;
mod error;
mod models;
mod reconcile;
mod store;
mod tasks;
mod users;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use crate::app_state::AppState;
use crate::reconcile::Reconciler;
use crate::store::mongo::MongoStore;
use crate::store::Store;
use crate::tasks::{create_task, delete_task, get_task, list_tasks, update_task};
use crate::users::{create_user, delete_user, get_user, list_users, update_user};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let store: Arc<dyn Store> =
        Arc::new(MongoStore::init(&config.mongo_uri, &config.database_name).await);
    let reconciler = Reconciler::new(store.clone(), config.restamp_drifted_tasks);

    let bind_addr = config.bind_addr.clone();
    info!("Server running at http://{}", bind_addr);
    info!("Allowed CORS Origin: {}", config.frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(AppState {
                store: store.clone(),
                reconciler: reconciler.clone(),
            }))
            .service(
                web::scope("/api")
                    // TASKS
                    .service(
                        web::scope("/tasks")
                            .route("", web::get().to(list_tasks))
                            .route("", web::post().to(create_task))
                            .route("/{id}", web::get().to(get_task))
                            .route("/{id}", web::put().to(update_task))
                            .route("/{id}", web::delete().to(delete_task))
                    )
                    // USERS
                    .service(
                        web::scope("/users")
                            .route("", web::get().to(list_users))
                            .route("", web::post().to(create_user))
                            .route("/{id}", web::get().to(get_user))
                            .route("/{id}", web::put().to(update_user))
                            .route("/{id}", web::delete().to(delete_user))
                    )
            )
    })
        .bind(&bind_addr)?
        .run()
        .await
}
