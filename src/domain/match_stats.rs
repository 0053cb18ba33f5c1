//! Match enrichment: participant disambiguation, team aggregates, and
//! roster normalization for shared League matches.
//!
//! A shared-match entry carries metadata captured at share time, which
//! can drift from the authoritative match record (patch resets, renames,
//! missing puuid). Resolution therefore runs an ordered fallback chain
//! and only acts on an unambiguous match at each step — a wrong
//! attribution is worse than a degraded card.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::feed_item::AuthorRef;

/// Name shown when every fallback in the display-name chain misses.
const UNKNOWN_PLAYER: &str = "Unknown Player";
/// Default divisor for team averages when the roster yields no team.
const DEFAULT_TEAM_SIZE: f64 = 5.0;

/// Team side derived from the Riot team id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    /// Team id 100.
    Blue,
    /// Any other team id.
    Red,
}

impl TeamSide {
    /// Maps a raw team id to a side. `100` is blue, everything else red.
    #[must_use]
    pub const fn from_team_id(team_id: i64) -> Self {
        if team_id == 100 { Self::Blue } else { Self::Red }
    }
}

/// Canonical lane role, used to sort the normalized roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Top lane.
    Top,
    /// Jungle.
    Jungle,
    /// Mid lane.
    Mid,
    /// Bot lane carry.
    Bot,
    /// Support.
    Support,
    /// Unrecognized or missing position string.
    Unknown,
}

impl Role {
    /// Normalizes a raw position token into a canonical role.
    ///
    /// Riot payloads use `TOP`/`JUNGLE`/`MIDDLE`/`BOTTOM`/`UTILITY`;
    /// share-time metadata has been seen with the colloquial spellings.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "TOP" => Self::Top,
            "JUNGLE" | "JNG" | "JUNGLER" => Self::Jungle,
            "MIDDLE" | "MID" => Self::Mid,
            "BOTTOM" | "BOT" | "ADC" | "CARRY" => Self::Bot,
            "UTILITY" | "SUPPORT" | "SUP" => Self::Support,
            _ => Self::Unknown,
        }
    }

    /// Sort key: top through support, unknowns last.
    #[must_use]
    pub const fn sort_key(&self) -> u8 {
        match self {
            Self::Top => 0,
            Self::Jungle => 1,
            Self::Mid => 2,
            Self::Bot => 3,
            Self::Support => 4,
            Self::Unknown => 5,
        }
    }
}

/// One seat in the authoritative ten-entry roster, extracted leniently
/// from a match record's `full_json` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RosterEntry {
    /// Stable player identifier.
    pub puuid: String,
    /// Champion numeric id.
    pub champion_id: i64,
    /// Champion display name.
    pub champion_name: String,
    /// Kills.
    pub kills: i64,
    /// Deaths.
    pub deaths: i64,
    /// Assists.
    pub assists: i64,
    /// Riot team id (100 or 200).
    pub team_id: i64,
    /// Whether this seat's team won.
    pub win: bool,
    /// Damage dealt to champions.
    pub total_damage_dealt_to_champions: i64,
    /// Gold earned.
    pub gold_earned: i64,
    /// Vision score.
    pub vision_score: i64,
    /// Damage dealt to turrets.
    pub damage_dealt_to_turrets: i64,
    /// Lane minion kills.
    pub total_minions_killed: i64,
    /// Jungle monster kills.
    pub neutral_minions_killed: i64,
    /// Riot ID game name (current account system).
    pub riot_id_game_name: Option<String>,
    /// Riot ID tagline.
    pub riot_id_tagline: Option<String>,
    /// Legacy summoner name.
    pub summoner_name: Option<String>,
    /// Assigned team position.
    pub team_position: Option<String>,
    /// Computed individual position.
    pub individual_position: Option<String>,
}

impl RosterEntry {
    /// Canonical role, preferring the assigned team position over the
    /// computed individual one.
    #[must_use]
    pub fn role(&self) -> Role {
        self.team_position
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.individual_position.as_deref())
            .map_or(Role::Unknown, Role::parse)
    }

    /// Display name without external fallbacks: Riot ID game name (with
    /// tag when present), else summoner name, else `None`.
    #[must_use]
    pub fn own_display_name(&self) -> Option<String> {
        if let Some(game_name) = self
            .riot_id_game_name
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            return Some(match self.riot_id_tagline.as_deref().filter(|s| !s.is_empty()) {
                Some(tag) => format!("{game_name}#{tag}"),
                None => game_name.to_string(),
            });
        }
        self.summoner_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Extracts the roster from a match record's `full_json` payload.
///
/// Accepts both the Riot v5 shape (`info.participants`) and a flattened
/// `participants` array. Entries that fail to deserialize are skipped;
/// a missing array yields an empty roster (degraded enrichment).
#[must_use]
pub fn roster_from_full_json(full_json: &serde_json::Value) -> Vec<RosterEntry> {
    let participants = full_json
        .get("info")
        .and_then(|info| info.get("participants"))
        .or_else(|| full_json.get("participants"))
        .and_then(|v| v.as_array());

    participants.map_or_else(Vec::new, |arr| {
        arr.iter()
            .filter_map(|p| serde_json::from_value(p.clone()).ok())
            .collect()
    })
}

/// Extracts the game duration in seconds from `full_json`, checking the
/// v5 location first. Missing or non-numeric durations yield zero.
#[must_use]
pub fn game_duration_secs(full_json: &serde_json::Value) -> i64 {
    full_json
        .get("info")
        .and_then(|info| info.get("gameDuration"))
        .or_else(|| full_json.get("gameDuration"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0)
}

/// Share-time hints about the sharer's seat, assembled from entry
/// metadata and (where available) the authoritative participant row.
#[derive(Debug, Clone, Default)]
pub struct SharerHints {
    /// Stable player identifier, possibly stale.
    pub puuid: Option<String>,
    /// Champion id at share time.
    pub champion_id: Option<i64>,
    /// Kills at share time.
    pub kills: Option<i64>,
    /// Deaths at share time.
    pub deaths: Option<i64>,
    /// Assists at share time.
    pub assists: Option<i64>,
    /// Display name at share time.
    pub display_name: Option<String>,
    /// Win flag at share time.
    pub win: Option<bool>,
}

impl SharerHints {
    /// Reads hints out of the loosely-typed metadata bag persisted when
    /// the match was shared. Every field is optional; wrong-typed
    /// values are ignored.
    #[must_use]
    pub fn from_metadata(metadata: &serde_json::Value) -> Self {
        Self {
            puuid: string_field(metadata, &["puuid", "summonerPuuid"]),
            champion_id: int_field(metadata, &["championId", "champion_id"]),
            kills: int_field(metadata, &["kills"]),
            deaths: int_field(metadata, &["deaths"]),
            assists: int_field(metadata, &["assists"]),
            display_name: string_field(
                metadata,
                &["riotIdGameName", "summonerName", "displayName"],
            ),
            win: metadata.get("win").and_then(serde_json::Value::as_bool),
        }
    }

    /// Fills absent fields from another hint set. Used to let the
    /// authoritative participant row back-fill stale metadata.
    pub fn fill_missing(&mut self, other: &Self) {
        if self.puuid.is_none() {
            self.puuid.clone_from(&other.puuid);
        }
        if self.champion_id.is_none() {
            self.champion_id = other.champion_id;
        }
        if self.kills.is_none() {
            self.kills = other.kills;
        }
        if self.deaths.is_none() {
            self.deaths = other.deaths;
        }
        if self.assists.is_none() {
            self.assists = other.assists;
        }
        if self.display_name.is_none() {
            self.display_name.clone_from(&other.display_name);
        }
        if self.win.is_none() {
            self.win = other.win;
        }
    }
}

fn string_field(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(k).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(value: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| value.get(k).and_then(serde_json::Value::as_i64))
}

/// Resolves the sharer's seat in the roster via the ordered fallback
/// chain. Each step acts only on an unambiguous match:
///
/// 1. Exact puuid.
/// 2. Champion id + kills + deaths + assists, all four exact. A unique
///    hit wins; multiple hits are tie-broken by case-insensitive display
///    name, else the first candidate in roster order is taken.
/// 3. Champion id alone, only when exactly one seat has that champion.
///
/// Deterministic for a fixed roster and fixed hints.
#[must_use]
pub fn resolve_participant<'r>(
    roster: &'r [RosterEntry],
    hints: &SharerHints,
) -> Option<&'r RosterEntry> {
    if let Some(puuid) = hints.puuid.as_deref().filter(|s| !s.is_empty()) {
        if let Some(entry) = roster.iter().find(|e| e.puuid == puuid) {
            return Some(entry);
        }
    }

    if let (Some(champ), Some(kills), Some(deaths), Some(assists)) =
        (hints.champion_id, hints.kills, hints.deaths, hints.assists)
    {
        let candidates: Vec<&RosterEntry> = roster
            .iter()
            .filter(|e| {
                e.champion_id == champ
                    && e.kills == kills
                    && e.deaths == deaths
                    && e.assists == assists
            })
            .collect();
        match candidates.as_slice() {
            [] => {}
            [only] => return Some(*only),
            many => {
                if let Some(name) = hints.display_name.as_deref() {
                    if let Some(by_name) = many.iter().find(|e| {
                        e.own_display_name()
                            .is_some_and(|n| n.eq_ignore_ascii_case(name))
                            || e.riot_id_game_name
                                .as_deref()
                                .is_some_and(|n| n.eq_ignore_ascii_case(name))
                            || e.summoner_name
                                .as_deref()
                                .is_some_and(|n| n.eq_ignore_ascii_case(name))
                    }) {
                        return Some(*by_name);
                    }
                }
                // Best-effort: known false-attribution risk, kept as-is.
                return many.first().copied();
            }
        }
    }

    if let Some(champ) = hints.champion_id {
        let mut with_champ = roster.iter().filter(|e| e.champion_id == champ);
        if let (Some(only), None) = (with_champ.next(), with_champ.next()) {
            return Some(only);
        }
    }

    None
}

/// Team-level aggregates computed over the resolved seat's teammates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAggregates {
    /// Sum of damage to champions across the team.
    pub team_total_damage: i64,
    /// Sum of gold earned across the team.
    pub team_total_gold: i64,
    /// Sum of kills across the team.
    pub team_total_kills: i64,
    /// Average damage to champions per teammate.
    pub team_avg_damage: f64,
    /// Average gold per teammate.
    pub team_avg_gold: f64,
    /// Average vision score per teammate.
    pub team_avg_vision_score: f64,
    /// Average damage to turrets per teammate.
    pub team_avg_turret_damage: f64,
    /// Mean of per-teammate `(kills + assists) / team kills`.
    pub team_avg_kill_participation: f64,
    /// Mean of per-teammate creep score per minute.
    pub team_avg_cs_per_min: f64,
}

/// Computes team aggregates for the given teammates.
///
/// Averages divide by the actual team size (5 when the slice is empty);
/// kill participation is zero when the team scored no kills; CS/min
/// floors the game duration at one minute.
#[must_use]
pub fn team_aggregates(team: &[&RosterEntry], duration_secs: i64) -> TeamAggregates {
    let divisor = if team.is_empty() {
        DEFAULT_TEAM_SIZE
    } else {
        team.len() as f64
    };
    let minutes = (duration_secs as f64 / 60.0).max(1.0);

    let team_total_damage: i64 = team.iter().map(|e| e.total_damage_dealt_to_champions).sum();
    let team_total_gold: i64 = team.iter().map(|e| e.gold_earned).sum();
    let team_total_kills: i64 = team.iter().map(|e| e.kills).sum();
    let total_vision: i64 = team.iter().map(|e| e.vision_score).sum();
    let total_turret: i64 = team.iter().map(|e| e.damage_dealt_to_turrets).sum();

    let kill_participation_sum: f64 = if team_total_kills > 0 {
        team.iter()
            .map(|e| (e.kills + e.assists) as f64 / team_total_kills as f64)
            .sum()
    } else {
        0.0
    };
    let cs_per_min_sum: f64 = team
        .iter()
        .map(|e| (e.total_minions_killed + e.neutral_minions_killed) as f64 / minutes)
        .sum();

    TeamAggregates {
        team_total_damage,
        team_total_gold,
        team_total_kills,
        team_avg_damage: team_total_damage as f64 / divisor,
        team_avg_gold: team_total_gold as f64 / divisor,
        team_avg_vision_score: total_vision as f64 / divisor,
        team_avg_turret_damage: total_turret as f64 / divisor,
        team_avg_kill_participation: kill_participation_sum / divisor,
        team_avg_cs_per_min: cs_per_min_sum / divisor,
    }
}

/// KDA with deaths-free games counted as `kills + assists`.
#[must_use]
pub fn kda(kills: i64, deaths: i64, assists: i64) -> f64 {
    if deaths > 0 {
        (kills + assists) as f64 / deaths as f64
    } else {
        (kills + assists) as f64
    }
}

/// One normalized seat in the enriched item's roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayer {
    /// Stable player identifier.
    pub puuid: String,
    /// Champion numeric id.
    pub champion_id: i64,
    /// Champion display name.
    pub champion_name: String,
    /// Kills.
    pub kills: i64,
    /// Deaths.
    pub deaths: i64,
    /// Assists.
    pub assists: i64,
    /// Computed KDA.
    pub kda: f64,
    /// Resolved display name (Riot ID > summoner name > store fallback
    /// by puuid > placeholder).
    pub display_name: String,
    /// Team side.
    pub team: TeamSide,
    /// Canonical lane role.
    pub role: Role,
    /// Damage dealt to champions, for cross-player comparison.
    pub damage_to_champions: i64,
    /// Gold earned, for cross-player comparison.
    pub gold_earned: i64,
    /// Whether this seat is the resolved sharer.
    pub is_sharer: bool,
}

/// A shared match entry after enrichment, ready to serve in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMatchItem {
    /// Share-entry id (the feed item id).
    pub id: String,
    /// Authoritative match id.
    pub match_id: String,
    /// Sharer user id (author key for the diversity filter).
    pub shared_by: String,
    /// Sharer profile, when the batch lookup resolved it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_by_profile: Option<AuthorRef>,
    /// Sharer's champion id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion_id: Option<i64>,
    /// Sharer's champion name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion_name: Option<String>,
    /// Sharer's kills.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kills: Option<i64>,
    /// Sharer's deaths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaths: Option<i64>,
    /// Sharer's assists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assists: Option<i64>,
    /// Sharer's computed KDA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kda: Option<f64>,
    /// Whether the sharer's team won.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win: Option<bool>,
    /// Game duration in seconds, when the record loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_duration_secs: Option<i64>,
    /// Team aggregates; absent on degraded items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_stats: Option<TeamAggregates>,
    /// Normalized ten-player roster; absent on degraded items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_players: Option<Vec<MatchPlayer>>,
    /// Share timestamp; drives ordering and cursor watermarks.
    pub created_at: DateTime<Utc>,
}

/// Identity of the share entry being enriched.
#[derive(Debug, Clone)]
pub struct EntryIdentity {
    /// Share-entry id.
    pub id: String,
    /// Authoritative match id.
    pub match_id: String,
    /// Sharer user id.
    pub shared_by: String,
    /// Share timestamp.
    pub created_at: DateTime<Utc>,
}

/// Runs the enrichment pipeline for one share entry.
///
/// `name_fallback` maps puuid to a display name sourced from the
/// authoritative participant store, used when a roster seat carries no
/// usable name of its own. An empty roster produces a degraded item
/// carrying only the hint-level stats.
#[must_use]
pub fn build_enriched_item(
    identity: EntryIdentity,
    profile: Option<AuthorRef>,
    hints: &SharerHints,
    roster: &[RosterEntry],
    duration_secs: i64,
    name_fallback: &HashMap<String, String>,
) -> EnrichedMatchItem {
    let mut item = EnrichedMatchItem {
        id: identity.id,
        match_id: identity.match_id,
        shared_by: identity.shared_by,
        shared_by_profile: profile,
        champion_id: hints.champion_id,
        champion_name: None,
        kills: hints.kills,
        deaths: hints.deaths,
        assists: hints.assists,
        kda: match (hints.kills, hints.deaths, hints.assists) {
            (Some(k), Some(d), Some(a)) => Some(kda(k, d, a)),
            _ => None,
        },
        win: hints.win,
        game_duration_secs: None,
        team_stats: None,
        all_players: None,
        created_at: identity.created_at,
    };

    let Some(resolved) = resolve_participant(roster, hints) else {
        return item;
    };

    item.champion_id = Some(resolved.champion_id);
    item.champion_name = Some(resolved.champion_name.clone());
    item.kills = Some(resolved.kills);
    item.deaths = Some(resolved.deaths);
    item.assists = Some(resolved.assists);
    item.kda = Some(kda(resolved.kills, resolved.deaths, resolved.assists));
    item.win = Some(resolved.win);
    item.game_duration_secs = Some(duration_secs);

    let team: Vec<&RosterEntry> = roster
        .iter()
        .filter(|e| e.team_id == resolved.team_id)
        .collect();
    item.team_stats = Some(team_aggregates(&team, duration_secs));

    let mut players: Vec<MatchPlayer> = roster
        .iter()
        .map(|e| MatchPlayer {
            puuid: e.puuid.clone(),
            champion_id: e.champion_id,
            champion_name: e.champion_name.clone(),
            kills: e.kills,
            deaths: e.deaths,
            assists: e.assists,
            kda: kda(e.kills, e.deaths, e.assists),
            display_name: e
                .own_display_name()
                .or_else(|| name_fallback.get(&e.puuid).cloned())
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
            team: TeamSide::from_team_id(e.team_id),
            role: e.role(),
            damage_to_champions: e.total_damage_dealt_to_champions,
            gold_earned: e.gold_earned,
            is_sharer: std::ptr::eq(e, resolved),
        })
        .collect();
    players.sort_by_key(|p| (p.team != TeamSide::Blue, p.role.sort_key()));
    item.all_players = Some(players);

    item
}
