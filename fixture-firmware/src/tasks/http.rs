// HTTP Server Task - Control Surface der Leuchte
use core::fmt::Write as _;

use defmt::{error, info, warn};
use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::extract::Json;
use picoserve::io::embedded_io_async;
use picoserve::response::{IntoResponse, Response, StatusCode};
use picoserve::routing::{get, post};

use crate::config::*;
use crate::web::{
    INDEX_HTML,
    protocol::{ErrorResponse, MessageResponse, PresetRequest, SaveDataResponse, StatusResponse},
};
use crate::{ColorRequest, Fixture, FixtureError, FixtureStatus, SnapshotRequest};

/// Meldung nach erfolgreicher Farbänderung (gleicher Text wie die alte Web-Oberfläche)
const COLOR_UPDATED: &str = "Post request successful";

/// Antwort eines Control-Endpoints
///
/// Der Controller liefert strukturierte Ergebnisse; erst hier wird daraus
/// JSON oder ein Redirect für den Browser.
enum ApiResponse {
    Message(&'static str),
    /// Import gespeichert, Browser soll zu /shutdown navigieren
    SaveData,
    Status(FixtureStatus),
    /// 303 See Other
    Redirect(&'static str),
    Error(FixtureError),
}

impl ApiResponse {
    /// Serialisiert den JSON-Body in `buffer`
    ///
    /// Gibt den HTTP-Status und die Länge des Bodies zurück (`None` wenn der
    /// Buffer nicht reicht).
    fn render_json(&self, buffer: &mut [u8]) -> (StatusCode, Option<usize>) {
        let written = match *self {
            ApiResponse::Message(message) => {
                serde_json_core::to_slice(&MessageResponse { message }, buffer)
            }
            ApiResponse::SaveData => serde_json_core::to_slice(
                &SaveDataResponse {
                    redirect: true,
                    redirect_url: "/shutdown",
                },
                buffer,
            ),
            ApiResponse::Status(status) => {
                serde_json_core::to_slice(&StatusResponse::from(status), buffer)
            }
            ApiResponse::Error(error) => {
                let mut message = heapless::String::<96>::new();
                // Zu langer Text wird abgeschnitten, der Fehler-Typ bleibt erhalten
                let _ = write!(message, "{}", error);
                let body = ErrorResponse {
                    error: error.kind(),
                    message: &message,
                };
                return (
                    StatusCode::new(error.status_code()),
                    serde_json_core::to_slice(&body, buffer).ok(),
                );
            }
            ApiResponse::Redirect(_) => return (StatusCode::new(303), Some(0)),
        };

        (StatusCode::OK, written.ok())
    }
}

impl IntoResponse for ApiResponse {
    async fn write_to<
        R: embedded_io_async::Read,
        W: picoserve::response::ResponseWriter<Error = R::Error>,
    >(
        self,
        connection: picoserve::response::Connection<'_, R>,
        response_writer: W,
    ) -> Result<picoserve::ResponseSent, W::Error> {
        if let ApiResponse::Redirect(location) = self {
            return Response::new(StatusCode::new(303), "")
                .with_header("Location", location)
                .write_to(connection, response_writer)
                .await;
        }

        let mut json_buffer = [0u8; JSON_RESPONSE_BUFFER_SIZE];
        let (status, written) = self.render_json(&mut json_buffer);

        match written.and_then(|n| core::str::from_utf8(&json_buffer[..n]).ok()) {
            Some(body) => {
                Response::new(status, body)
                    .with_header("Content-Type", "application/json")
                    .write_to(connection, response_writer)
                    .await
            }
            None => {
                error!("HTTP: JSON response did not fit into buffer");
                Response::new(StatusCode::new(500), "Internal Server Error")
                    .write_to(connection, response_writer)
                    .await
            }
        }
    }
}

/// HTTP Server Task - läuft parallel zu anderen Tasks
///
/// Routen:
/// - `GET /`: index.html
/// - `GET /state`: Betriebszustand + persistierter Datensatz
/// - `GET /startup`: einschalten, Redirect auf `/?is_on=true`
/// - `POST /control`: Farbe setzen (`{"red":..,"green":..,"blue":..}`)
/// - `POST /preset`: Preset setzen (`{"preset":"ocean"}`)
/// - `POST /save_data`: kompletten Zustand importieren
/// - `GET /shutdown`: ausschalten, Redirect auf `/?is_on=false`
/// - `POST /reset`: Datensatz auf Default zurücksetzen
///
/// **Task Pool:** Diese Task wird `HTTP_TASK_COUNT`x gespawnt für concurrent
/// connections. Alle Instanzen teilen sich `fixture`; jede Operation läuft
/// komplett im Lock.
///
/// # Parameter
/// - `task_id`: Eindeutige ID für diese Server-Instanz (0..3)
/// - `stack`: embassy-net Stack für Netzwerk-Zugriff
/// - `fixture`: die geteilte Leuchte
#[embassy_executor::task(pool_size = 4)]
pub async fn http_server_task(
    task_id: usize,
    stack: &'static Stack<'static>,
    fixture: &'static Fixture,
) {
    info!("HTTP: Server task {} starting on port {}...", task_id, HTTP_PORT);

    let app = picoserve::Router::new()
        .route("/", get(move || async move { serve_html(fixture) }))
        .route("/state", get(move || async move { state(fixture) }))
        .route("/startup", get(move || async move { startup(fixture) }))
        .route(
            "/control",
            post(move |Json(request): Json<ColorRequest>| async move {
                control(fixture, request)
            }),
        )
        .route(
            "/preset",
            post(move |Json(request): Json<PresetRequest>| async move {
                preset(fixture, request)
            }),
        )
        .route(
            "/save_data",
            post(move |Json(request): Json<SnapshotRequest>| async move {
                save_data(fixture, request)
            }),
        )
        .route("/shutdown", get(move || async move { shutdown(fixture) }))
        .route("/reset", post(move || async move { reset(fixture) }));

    // Server-Konfiguration
    let config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(1)),
        persistent_start_read_request: Some(Duration::from_secs(5)),
    })
    .keep_connection_alive();

    // HTTP-Buffer für Requests/Responses
    let mut http_buffer = [0u8; HTTP_BUFFER_SIZE];

    // TCP-Buffers für Socket
    let mut rx_buffer = [0u8; TCP_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_TX_BUFFER_SIZE];

    let server = picoserve::Server::new(&app, &config, &mut http_buffer);

    let _ = server
        .listen_and_serve(task_id, *stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;

    info!("HTTP: Server task {} ended", task_id);
}

/// Serviert die HTML-Hauptseite
///
/// Die Seite holt den Zustand selbst über `/state`; hier wird er nur geloggt,
/// damit ein defekter Datensatz schon beim Laden auffällt.
fn serve_html(fixture: &Fixture) -> impl IntoResponse {
    match fixture.status() {
        Ok(status) => info!("HTTP: GET / (powered: {}, {})", status.powered, status.state),
        Err(e) => warn!("HTTP: GET / with unusable persisted state: {}", e),
    }
    Response::new(StatusCode::OK, INDEX_HTML).with_header("Content-Type", "text/html; charset=utf-8")
}

// ============================================================================
// Handler (synchron, laufen komplett im Lock der Leuchte)
// ============================================================================

fn state(fixture: &Fixture) -> ApiResponse {
    match fixture.status() {
        Ok(status) => ApiResponse::Status(status),
        Err(e) => failed("GET /state", e),
    }
}

fn startup(fixture: &Fixture) -> ApiResponse {
    match fixture.power_on() {
        Ok(state) => {
            info!("HTTP: GET /startup -> powered on, {}", state);
            ApiResponse::Redirect("/?is_on=true")
        }
        Err(e) => failed("GET /startup", e),
    }
}

fn control(fixture: &Fixture, request: ColorRequest) -> ApiResponse {
    info!("HTTP: POST /control {}", request);
    match fixture.set_color(request) {
        Ok(state) => {
            info!("HTTP: Color set, {}", state);
            ApiResponse::Message(COLOR_UPDATED)
        }
        Err(e) => failed("POST /control", e),
    }
}

fn preset(fixture: &Fixture, request: PresetRequest) -> ApiResponse {
    info!("HTTP: POST /preset {}", request.preset);
    match fixture.apply_preset(request.preset) {
        Ok(state) => {
            info!("HTTP: Preset applied, {}", state);
            ApiResponse::Message(COLOR_UPDATED)
        }
        Err(e) => failed("POST /preset", e),
    }
}

fn save_data(fixture: &Fixture, request: SnapshotRequest) -> ApiResponse {
    match fixture.import_request(request) {
        Ok(state) => {
            info!("HTTP: POST /save_data -> stored {}", state);
            ApiResponse::SaveData
        }
        Err(e) => failed("POST /save_data", e),
    }
}

fn shutdown(fixture: &Fixture) -> ApiResponse {
    match fixture.power_off() {
        Ok(state) => {
            info!("HTTP: GET /shutdown -> powered off, {}", state);
            ApiResponse::Redirect("/?is_on=false")
        }
        Err(e) => failed("GET /shutdown", e),
    }
}

fn reset(fixture: &Fixture) -> ApiResponse {
    match fixture.restore_defaults() {
        Ok(_) => {
            warn!("HTTP: POST /reset -> persisted state restored to defaults");
            ApiResponse::Message("State reset to defaults")
        }
        Err(e) => failed("POST /reset", e),
    }
}

/// Loggt den Fehler und gibt ihn an den Client weiter
fn failed(route: &str, error: FixtureError) -> ApiResponse {
    if error.is_client_error() {
        warn!("HTTP: {} rejected: {}", route, error);
    } else {
        error!("HTTP: {} failed: {}", route, error);
    }
    ApiResponse::Error(error)
}
