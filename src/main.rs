use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, error, warn};

// 从 lib.rs 导入模块
use rust_assignment_tracker::config::AppConfig;
use rust_assignment_tracker::models::AppStartTime;
use rust_assignment_tracker::routes;
use rust_assignment_tracker::runtime::lifetime;
use rust_assignment_tracker::utils::{path_error_handler, query_error_handler};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    // 启动前预处理 //

    // 初始化配置
    setup_panic!();
    AppConfig::init().expect("Failed to initialize configuration");
    let config = AppConfig::get();

    // 初始化日志
    let stdout_log = std::io::stdout();
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(stdout_log);
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);
    let tracing_format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_ansi(true);

    let tracing_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer)
        .event_format(tracing_format);

    if config.is_development() {
        tracing_builder
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_builder.json().init();
    }

    // 打印信息
    warn!(
        "Starting pre-startup processing...
        Project: {}
        Version: {}
        Authors: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    );

    let startup = match lifetime::startup::prepare_server_startup(config).await {
        Ok(startup) => startup,
        Err(e) => {
            #[cfg(debug_assertions)]
            error!("{}", e.format_colored());
            #[cfg(not(debug_assertions))]
            error!("{}", e.format_simple());
            return Err(std::io::Error::other(e));
        }
    };
    let tracker = startup.tracker.clone();
    let shutdown = tracker.shutdown_token();

    // 输出预处理时间
    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time.start_datetime)
            .num_milliseconds()
    );

    // 预处理完成 //

    // 定时对账
    let scheduler = if config.reconcile.enabled && !config.classroom.access_token.is_empty() {
        Some(tokio::spawn(lifetime::scheduler::run_scheduler(
            tracker.clone(),
            std::time::Duration::from_secs(config.reconcile.interval_secs),
        )))
    } else {
        // 没有服务端令牌时只能通过 HTTP 接口用调用方身份触发
        warn!("Scheduled reconciliation is disabled (reconcile.enabled=false or no classroom.access_token)");
        None
    };

    warn!("Using {} CPU cores for the server", config.server.workers);

    // Start the HTTP server
    let tracker_data = web::Data::from(tracker.clone());
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(config.cors.max_age),
            )
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler)) // 设置查询参数错误处理器
            .app_data(web::PathConfig::default().error_handler(path_error_handler)) // 设置路径参数错误处理器
            .app_data(tracker_data.clone())
            .app_data(web::PayloadConfig::new(config.server.max_payload_size)) // 设置最大请求体大小
            .configure(routes::configure_assignments_routes) // 配置作业相关路由
            .configure(routes::configure_submissions_routes) // 配置提交文件相关路由
            .configure(routes::configure_reconcile_routes) // 配置对账相关路由
    })
    .workers(config.server.workers)
    .disable_signals();

    let server = {
        #[cfg(unix)]
        {
            if let Some(socket_path) = config.unix_socket_path() {
                warn!("Starting server on Unix socket: {}", socket_path);
                if std::path::Path::new(socket_path).exists() {
                    std::fs::remove_file(socket_path)?;
                }
                server.bind_uds(socket_path)?
            } else {
                let bind_address = config.server_bind_address();
                warn!("Starting server at http://{}", bind_address);
                server.bind(bind_address)?
            }
        }

        #[cfg(not(unix))]
        {
            let bind_address = config.server_bind_address();
            warn!("Starting server at http://{}", bind_address);
            server.bind(bind_address)?
        }
    }
    .run();
    let server_handle = server.handle();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(shutdown.clone()) => {
            server_handle.stop(true).await;
        }
    }

    // 等待进行中的对账在当前条目处停下
    shutdown.cancel();
    if let Some(scheduler) = scheduler
        && let Err(e) = scheduler.await
    {
        error!("Scheduler task failed: {}", e);
    }
    warn!("Graceful shutdown: all tasks completed");

    Ok(())
}
