//! Parsers for the text responses Minecraft servers return over RCON.
//!
//! The wire layer hands responses back verbatim; this module turns the
//! common diagnostic ones (`tps`, `mspt`, `list`, `worlds`) into structured
//! data, tolerating the color codes Paper-family servers embed.

use std::sync::LazyLock;

use regex::Regex;

static COLOR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("§.").expect("color code pattern is valid"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("decimal pattern is valid"));
static PLAYER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"There are (\d+) of a max of (\d+) players online:\s*(.*)")
        .expect("player list pattern is valid")
});
static WORLD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]*(\w[\w_]*)").expect("world line pattern is valid"));

/// Server TPS (ticks per second) over the 1m/5m/15m windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpsSample {
    pub one_minute: f64,
    pub five_minute: f64,
    pub fifteen_minute: f64,
}

/// Server MSPT (milliseconds per tick) over the 5s/10s/60s windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsptSample {
    pub five_second: f64,
    pub ten_second: f64,
    pub sixty_second: f64,
}

/// Result of a `list` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerList {
    pub online: u32,
    pub max: u32,
    pub players: Vec<String>,
}

/// Strips Minecraft formatting codes (`§` followed by one character).
pub fn strip_color_codes(input: &str) -> String {
    COLOR_CODE.replace_all(input, "").into_owned()
}

/// Parses a `tps` response. Falls back to a healthy 20.0 across the board
/// when fewer than three numbers are present.
pub fn parse_tps(response: &str) -> TpsSample {
    match three_decimals(response) {
        Some([a, b, c]) => TpsSample {
            one_minute: a,
            five_minute: b,
            fifteen_minute: c,
        },
        None => TpsSample {
            one_minute: 20.0,
            five_minute: 20.0,
            fifteen_minute: 20.0,
        },
    }
}

/// Parses an `mspt` response. Defaults to zeros when parsing fails.
pub fn parse_mspt(response: &str) -> MsptSample {
    match three_decimals(response) {
        Some([a, b, c]) => MsptSample {
            five_second: a,
            ten_second: b,
            sixty_second: c,
        },
        None => MsptSample {
            five_second: 0.0,
            ten_second: 0.0,
            sixty_second: 0.0,
        },
    }
}

/// Parses a `list` response, e.g.
/// `There are 3 of a max of 20 players online: Steve, Alex, Notch`.
pub fn parse_player_list(response: &str) -> PlayerList {
    let clean = strip_color_codes(response);
    let Some(captures) = PLAYER_LIST.captures(&clean) else {
        return PlayerList {
            online: 0,
            max: 20,
            players: Vec::new(),
        };
    };

    let online = captures[1].parse().unwrap_or(0);
    let max = captures[2].parse().unwrap_or(20);
    let players = captures[3]
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    PlayerList {
        online,
        max,
        players,
    }
}

/// Parses a `worlds` response (Paper servers) into world names, one per
/// line like `- world (DIM0): Loaded`.
pub fn parse_world_list(response: &str) -> Vec<String> {
    strip_color_codes(response)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| WORLD_LINE.captures(line))
        .map(|captures| captures[1].to_string())
        .collect()
}

fn three_decimals(response: &str) -> Option<[f64; 3]> {
    let clean = strip_color_codes(response);
    let mut numbers = DECIMAL
        .find_iter(&clean)
        .filter_map(|m| m.as_str().parse::<f64>().ok());
    Some([numbers.next()?, numbers.next()?, numbers.next()?])
}
