use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::http::StatusCode;

use crate::session::{SessionCoordinator, SessionError};
use uno_types::{Card, CardColor, CardValue, ErrorKind, ErrorResponse, PlayRequest};

pub mod auth;
pub mod config;
pub mod game_manager;
pub mod session;

#[derive(Deserialize)]
struct PlayQuery {
    choose: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    active_games: usize,
}

pub fn create_routes(
    session: Arc<SessionCoordinator>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let session_filter = warp::any().map({
        let session = session.clone();
        move || session.clone()
    });
    let auth_header = warp::header::optional::<String>("authorization");

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_filter.clone())
        .map(|session: Arc<SessionCoordinator>| {
            warp::reply::json(&HealthResponse {
                status: "ok",
                active_games: session.engine().active_games_count(),
            })
        });

    let create_game = warp::path!("games")
        .and(warp::post())
        .and(session_filter.clone())
        .and_then(handle_create_game);

    let host_game = warp::path!("newgame" / String)
        .and(warp::post())
        .and(session_filter.clone())
        .and_then(handle_host_game);

    let join_game = warp::path!("login" / Uuid / String)
        .and(warp::post())
        .and(auth_header.clone())
        .and(session_filter.clone())
        .and_then(handle_join);

    let start_game = warp::path!("startgame")
        .and(warp::post())
        .and(auth_header.clone())
        .and(session_filter.clone())
        .and_then(handle_start);

    let play_card = warp::path!("play" / String / String)
        .and(warp::post())
        .and(warp::query::<PlayQuery>())
        .and(auth_header.clone())
        .and(session_filter.clone())
        .and_then(handle_play);

    let draw_card = warp::path!("draw")
        .and(warp::post())
        .and(auth_header.clone())
        .and(session_filter.clone())
        .and_then(handle_draw);

    let update = warp::path!("update")
        .and(warp::get())
        .and(auth_header)
        .and(session_filter)
        .and_then(handle_update);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(create_game)
        .or(host_game)
        .or(join_game)
        .or(start_game)
        .or(play_card)
        .or(draw_card)
        .or(update)
        .with(cors)
        .with(warp::log("uno_arena"))
}

type Reply = warp::reply::WithStatus<warp::reply::Json>;

async fn handle_create_game(
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    Ok(respond(session.create_game().await))
}

async fn handle_host_game(
    username: String,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let result = match decode_segment(&username) {
        Ok(name) => session.host_game(&name).await,
        Err(e) => Err(e),
    };
    Ok(respond(result))
}

async fn handle_join(
    game_id: Uuid,
    username: String,
    auth_header: Option<String>,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let existing = auth_header.as_deref().map(bearer).filter(|t| !t.is_empty());
    let result = match decode_segment(&username) {
        Ok(name) => session.join(game_id, &name, existing).await,
        Err(e) => Err(e),
    };
    Ok(respond(result))
}

async fn handle_start(
    auth_header: Option<String>,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let token = auth_header.as_deref().map(bearer).unwrap_or_default();
    Ok(respond(session.start(token).await))
}

async fn handle_play(
    value: String,
    color: String,
    query: PlayQuery,
    auth_header: Option<String>,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let request = match parse_play(&value, &color, query.choose.as_deref()) {
        Ok(request) => request,
        Err(message) => return Ok(bad_request(message)),
    };
    let token = auth_header.as_deref().map(bearer).unwrap_or_default();
    Ok(respond(session.play(token, request).await))
}

async fn handle_draw(
    auth_header: Option<String>,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let token = auth_header.as_deref().map(bearer).unwrap_or_default();
    Ok(respond(session.draw(token).await))
}

async fn handle_update(
    auth_header: Option<String>,
    session: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let token = auth_header.as_deref().map(bearer).unwrap_or_default();
    Ok(respond(session.poll(token).await))
}

/// Path segments arrive still percent-encoded (`Alice%20Smith`)
fn decode_segment(raw: &str) -> Result<String, SessionError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| SessionError::InvalidUsername(raw.to_string()))
}

fn bearer(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header)
}

/// Build a play request from path segments like `7/red` or `wild/wild?choose=blue`
fn parse_play(value: &str, color: &str, choose: Option<&str>) -> Result<PlayRequest, String> {
    let value: CardValue = value.parse().map_err(|e| format!("Invalid card value: {}", e))?;
    let card = if value.is_wild() {
        Card::new(value, CardColor::Wild)
    } else {
        let color: CardColor = color.parse().map_err(|e| format!("Invalid card color: {}", e))?;
        Card::new(value, color)
    };
    let chosen_color = choose
        .map(|c| c.parse::<CardColor>())
        .transpose()
        .map_err(|e| format!("Invalid chosen color: {}", e))?;

    Ok(PlayRequest { card, chosen_color })
}

fn respond<T: Serialize>(result: Result<T, SessionError>) -> Reply {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK),
        Err(e) => {
            let response = e.to_response();
            if response.kind == ErrorKind::Internal {
                tracing::error!("Request failed internally: {}", e);
            }
            warp::reply::with_status(warp::reply::json(&response), status_for(response.kind))
        }
    }
}

fn bad_request(message: String) -> Reply {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            kind: ErrorKind::InvalidRequest,
            message,
        }),
        StatusCode::BAD_REQUEST,
    )
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MissingToken
        | ErrorKind::InvalidSignature
        | ErrorKind::MalformedToken
        | ErrorKind::TokenExpired => StatusCode::UNAUTHORIZED,
        ErrorKind::GameNotFound | ErrorKind::PlayerNotInGame => StatusCode::NOT_FOUND,
        ErrorKind::NotHost => StatusCode::FORBIDDEN,
        ErrorKind::InvalidUsername | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::GameAlreadyStarted
        | ErrorKind::AlreadyJoined
        | ErrorKind::GameFull
        | ErrorKind::NotEnoughPlayers
        | ErrorKind::NotYourTurn
        | ErrorKind::IllegalCard
        | ErrorKind::CardNotInHand
        | ErrorKind::GameNotInProgress => StatusCode::CONFLICT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_paths() {
        let request = parse_play("7", "red", None).unwrap();
        assert_eq!(request.card, Card::number(7, CardColor::Red));
        assert_eq!(request.chosen_color, None);

        let request = parse_play("wild4", "wild", Some("blue")).unwrap();
        assert_eq!(request.card, Card::wild_draw_four());
        assert_eq!(request.chosen_color, Some(CardColor::Blue));

        assert!(parse_play("banana", "red", None).is_err());
        assert!(parse_play("skip", "purple", None).is_err());
        assert!(parse_play("wild", "wild", Some("orange")).is_err());
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("Alice%20Smith").unwrap(), "Alice Smith");
        assert_eq!(decode_segment("Bob").unwrap(), "Bob");
        assert!(matches!(
            decode_segment("%FF%FE"),
            Err(SessionError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        assert_eq!(bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(bearer("abc.def.ghi"), "abc.def.ghi");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidSignature), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::NotYourTurn), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Busy), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::NotHost), StatusCode::FORBIDDEN);
    }
}
