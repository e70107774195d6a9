//! HTTP server exposing `/metrics` for Prometheus scraping.

use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::{
	repositories::{ChainRepository, ChainService},
	utils::metrics::{gather_metrics, update_chain_metrics, update_system_metrics},
};

pub type ChainServiceArc = Arc<Mutex<ChainService<ChainRepository>>>;

pub type ChainServiceData = web::Data<ChainServiceArc>;

/// Binds to all interfaces when running in a container, keeping the requested port.
fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.rsplit_once(':') {
		Some((_, port)) if !port.is_empty() => format!("0.0.0.0:{}", port),
		_ => "0.0.0.0:8081".to_string(),
	}
}

async fn metrics_handler(chain_service: ChainServiceData) -> impl Responder {
	update_system_metrics();
	{
		let chains = chain_service.lock().await.get_all();
		update_chain_metrics(&chains);
	}

	match gather_metrics() {
		Ok(buffer) => HttpResponse::Ok()
			.content_type("text/plain; version=0.0.4; charset=utf-8")
			.body(buffer),
		Err(e) => {
			error!("Error gathering metrics: {}", e);
			HttpResponse::InternalServerError().finish()
		}
	}
}

/// Builds the metrics server; the caller decides where to drive it.
pub fn create_metrics_server(
	bind_address: String,
	chain_service: ChainServiceArc,
) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(&bind_address, in_docker);

	info!(
		"Starting metrics server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	Ok(HttpServer::new(move || {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.app_data(web::Data::new(chain_service.clone()))
			.route("/metrics", web::get().to(metrics_handler))
	})
	.workers(2)
	.bind(actual_bind_address)?
	.shutdown_timeout(5)
	.run())
}
