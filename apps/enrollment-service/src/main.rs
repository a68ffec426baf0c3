//! # Enrollment Service サーバー
//!
//! 講座・受講者の作成と受講登録を行う HTTP サービス。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `ENROLLMENT_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `ENROLLMENT_PORT` | **Yes** | ポート番号 |
//! | `STORAGE_BACKEND` | No | `postgres`（デフォルト）または `memory` |
//! | `DATABASE_URL` | postgres 時 | PostgreSQL 接続 URL |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト） |
//!
//! ## 起動方法
//!
//! ```bash
//! # インメモリストアで起動
//! ENROLLMENT_PORT=3000 STORAGE_BACKEND=memory cargo run -p enrollment-service
//!
//! # PostgreSQL で起動（起動時にマイグレーションを適用）
//! ENROLLMENT_PORT=3000 DATABASE_URL=postgres://... cargo run -p enrollment-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use enrollment_infra::{
    EnrollmentGateway,
    TransactionManager,
    db::{self, PgTransactionManager},
    gateway::{InMemoryStore, PostgresEnrollmentGateway},
};
use enrollment_service::{
    config::{ServiceConfig, StorageBackend},
    handler::{EnrollmentState, router},
    presenter::JsonPresenter,
    usecase::EnrollmentUseCaseImpl,
};
use enrollment_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Enrollment Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // 設定読み込み（ログ形式も含むため、トレーシング初期化より先に行う）
    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    // トレーシング初期化
    init_tracing(&TracingConfig::new("enrollment-service", config.log_format));

    tracing::info!(
        "Enrollment Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 永続化バックエンドを初期化
    let (gateway, tx_manager): (Arc<dyn EnrollmentGateway>, Arc<dyn TransactionManager>) =
        match &config.storage {
            StorageBackend::Postgres { database_url } => {
                let pool = db::create_pool(database_url)
                    .await
                    .context("データベース接続に失敗しました")?;
                db::run_migrations(&pool)
                    .await
                    .context("マイグレーションに失敗しました")?;
                tracing::info!("データベースに接続しました");

                let gateway: Arc<dyn EnrollmentGateway> =
                    Arc::new(PostgresEnrollmentGateway::new(pool.clone()));
                let tx_manager: Arc<dyn TransactionManager> =
                    Arc::new(PgTransactionManager::new(pool));
                (gateway, tx_manager)
            }
            StorageBackend::Memory => {
                tracing::warn!("インメモリストアで起動します（再起動でデータは失われます）");
                let store = InMemoryStore::new();
                let gateway: Arc<dyn EnrollmentGateway> = Arc::new(store.gateway());
                let tx_manager: Arc<dyn TransactionManager> =
                    Arc::new(store.transaction_manager());
                (gateway, tx_manager)
            }
        };

    let state = Arc::new(EnrollmentState {
        usecase:   EnrollmentUseCaseImpl::new(gateway, tx_manager),
        presenter: JsonPresenter,
    });

    // ルーター構築
    let app = router(state).layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできません"))?;
    tracing::info!("Enrollment Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
