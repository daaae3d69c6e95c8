use axum::{
    extract::{ConnectInfo, Path, State, WebSocketUpgrade},
    middleware,
    response::Response,
    routing::{delete, get, post},
    Extension, Router,
};
use axum_extra::TypedHeader;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{
    collections::HashMap,
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex},
};
use tokio::{
    net::TcpListener,
    sync::mpsc::{channel, Sender},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use uuid::Uuid;

use crate::{
    auth::{auth_middleware, User},
    configuration::{DatabaseSettings, Settings},
    document,
    error::ApiError,
    routes,
    websocket::{handle_socket, Room, RoomMessage},
};

pub struct Application {
    listener: TcpListener,
    router: Router,
    port: u16,
}

pub struct ApplicationState {
    pub pool: PgPool,
    pub rooms: Mutex<HashMap<Uuid, Sender<RoomMessage>>>,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, std::io::Error> {
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );

        let listener = TcpListener::bind(address).await?;
        let port = listener.local_addr()?.port();
        let connection_pool = get_connection_pool(&settings.database);

        let application_state = Arc::new(ApplicationState {
            pool: connection_pool,
            rooms: Mutex::new(HashMap::new()),
        });

        let router = Router::new()
            .route(
                "/api/documents",
                get(routes::list_documents).post(routes::create_document),
            )
            .route("/api/documents/shared", get(routes::list_shared_documents))
            .route("/api/documents/share", post(routes::share_document))
            .route(
                "/api/documents/share/:document_id/:user_id",
                delete(routes::remove_share),
            )
            .route(
                "/api/documents/:document_id",
                delete(routes::delete_document),
            )
            .route("/api/documents/:document_id/ws", get(ws_handler))
            .route_layer(middleware::from_fn_with_state(
                settings.application.signing_key,
                auth_middleware,
            ))
            .route("/", get(|| async { "Hello from collab server" }))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true)),
            )
            .layer(CorsLayer::permissive())
            .with_state(application_state);

        Ok(Self {
            listener,
            router,
            port,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!("listening on {}", self.listener.local_addr()?);
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(settings.with_db())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    ConnectInfo(_addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<ApplicationState>>,
    Path(document_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Response, ApiError> {
    let _user_agent = if let Some(TypedHeader(user_agent)) = user_agent {
        user_agent.to_string()
    } else {
        String::from("Unknown client")
    };

    let document_id = Uuid::from_str(&document_id)
        .map_err(|_| ApiError::BadRequest("please provide a valid document UUID".to_string()))?;

    let document = document::find_for_user(&state.pool, document_id, user.id)
        .await?
        .ok_or_else(|| {
            tracing::error!(
                ?user,
                document = %document_id,
                "user does not have access to document"
            );
            ApiError::DocumentNotFound(document_id)
        })?;

    let room_handle = get_or_create_room(state, document.id);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, room_handle)))
}

fn get_or_create_room(state: Arc<ApplicationState>, document_id: Uuid) -> Sender<RoomMessage> {
    let mut rooms = state.rooms.lock().expect("received rooms lock");
    let tx = rooms.get(&document_id);
    if let Some(tx) = tx {
        return tx.clone();
    }

    let (tx, rx) = channel::<RoomMessage>(128);
    rooms.insert(document_id, tx.clone());
    let room = Room::new(state.clone(), document_id, rx);
    room.run();

    tx
}
