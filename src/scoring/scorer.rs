//! The scoring session: one live game, the persisted stores behind it and the
//! in-memory stat books kept in step with the event log.
//!
//! Every operation validates before it touches anything. Writes go to the log
//! first; if a follow-up write fails the log append is rolled back so the
//! stores never disagree with the live state.

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::models::{HistoricalLine, PlateAppearanceEvent, PlayerStats, SeasonGameRecord};
use crate::db::{CsvTable, Database, MemoryTable, TableStore};
use crate::error::ScoringError;
use crate::roster::{Player, RosterProvider};
use crate::scoring::game::{GameState, PlateAppearance};
use crate::scoring::historical::{self, merge_delta, summarize};
use crate::scoring::odds::{compute_odds, OddsRow};
use crate::scoring::outcome::Role;
use crate::scoring::season::{newest_first, SeasonEdit, SeasonSummary};
use crate::scoring::stats::{aggregate, StatBook};
use crate::scoring::undo::UndoStack;

pub const EVENT_LOG_CSV: &str = "gameday_log.csv";
pub const PLAYER_STATS_CSV: &str = "player_stats.csv";
pub const SEASON_HISTORY_CSV: &str = "season_history.csv";
pub const SEASON_STATS_CSV: &str = "season_stats.csv";

/// The four persisted tables a scorer works against.
pub struct Stores {
    pub events: Box<dyn TableStore<PlateAppearanceEvent>>,
    pub stats: Box<dyn TableStore<PlayerStats>>,
    pub season: Box<dyn TableStore<SeasonGameRecord>>,
    pub season_stats: Box<dyn TableStore<HistoricalLine>>,
}

impl Stores {
    pub fn sqlite(db: &Database) -> Self {
        Stores {
            events: Box::new(db.table::<PlateAppearanceEvent>()),
            stats: Box::new(db.table::<PlayerStats>()),
            season: Box::new(db.table::<SeasonGameRecord>()),
            season_stats: Box::new(db.table::<HistoricalLine>()),
        }
    }

    pub fn csv(dir: &Path) -> Self {
        Stores {
            events: Box::new(CsvTable::new(dir.join(EVENT_LOG_CSV))),
            stats: Box::new(CsvTable::new(dir.join(PLAYER_STATS_CSV))),
            season: Box::new(CsvTable::new(dir.join(SEASON_HISTORY_CSV))),
            season_stats: Box::new(CsvTable::new(dir.join(SEASON_STATS_CSV))),
        }
    }

    pub fn memory() -> Self {
        Stores {
            events: Box::new(MemoryTable::new()),
            stats: Box::new(MemoryTable::new()),
            season: Box::new(MemoryTable::new()),
            season_stats: Box::new(MemoryTable::new()),
        }
    }
}

/// What the scoreboard shows for the game in progress.
#[derive(Debug, Clone, Serialize)]
pub struct Scoreboard {
    pub game: GameState,
    pub current_batter: Option<Player>,
    /// Cumulative line for the batter due up.
    pub current_batter_stats: Option<PlayerStats>,
    pub ltp_runs: u32,
    pub opp_runs: u32,
    pub can_undo: bool,
}

/// Odds table for one roster player.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerOdds {
    pub player: Player,
    pub line: HistoricalLine,
    pub odds: Vec<OddsRow>,
}

pub struct Scorer {
    roster: Arc<dyn RosterProvider>,
    stores: Stores,
    history_paths: Vec<PathBuf>,
    /// Cumulative stats across every logged event.
    season_book: StatBook,
    /// Stats for the game in progress only; merged into the historical
    /// source when the game ends.
    game_book: StatBook,
    game: Option<GameState>,
    /// Log length when the live game started. The game's events are the tail.
    log_start: usize,
    undo: UndoStack,
}

impl Scorer {
    /// Open a session. Cumulative stats are rebuilt from the event log and
    /// written back, so a stale stats table heals itself.
    pub fn open(
        roster: Arc<dyn RosterProvider>,
        stores: Stores,
        history_paths: Vec<PathBuf>,
    ) -> Result<Self> {
        let events = stores.events.load()?;
        let season_book = aggregate(&events);

        let stored = StatBook::from_rows(stores.stats.load()?);
        if stored != season_book {
            warn!(
                stored_players = stored.rows().len(),
                replayed_players = season_book.rows().len(),
                "Stored player stats disagree with the event log, rewriting from replay"
            );
        }
        stores.stats.replace(season_book.rows())?;

        info!(
            events = events.len(),
            players = season_book.rows().len(),
            history_sources = history_paths.len(),
            "Scorebook opened"
        );
        Ok(Scorer {
            roster,
            stores,
            history_paths,
            season_book,
            game_book: StatBook::new(),
            game: None,
            log_start: events.len(),
            undo: UndoStack::new(),
        })
    }

    pub fn roster(&self) -> Vec<Player> {
        self.roster.players()
    }

    /// Resolve a scorer-facing display label to a roster identity.
    pub fn player_by_label(&self, label: &str) -> Result<Player, ScoringError> {
        self.roster
            .find_by_label(label)
            .ok_or_else(|| ScoringError::PlayerNotInRoster(label.trim().to_string()))
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    fn live(&self) -> Result<&GameState, ScoringError> {
        self.game.as_ref().ok_or(ScoringError::NoActiveGame)
    }

    // ── Live game ──────────────────────────────────────────────────────────

    /// Start a game. An empty lineup bats the whole roster in roster order.
    pub fn start_game(
        &mut self,
        game_date: NaiveDate,
        opponent: &str,
        our_role: Role,
        lineup: Vec<Player>,
    ) -> Result<&GameState, ScoringError> {
        if self.game.is_some() {
            return Err(ScoringError::GameInProgress);
        }
        let players = self.roster.players();
        if players.is_empty() {
            return Err(ScoringError::EmptyRoster);
        }
        let lineup = if lineup.is_empty() {
            players
        } else {
            if let Some(stranger) = lineup.iter().find(|p| !players.contains(p)) {
                return Err(ScoringError::PlayerNotInRoster(stranger.display_label()));
            }
            lineup
        };

        let state = GameState::new(game_date, opponent, our_role, lineup);
        self.log_start = self.stores.events.load()?.len();
        info!(
            date = %state.game_date,
            opponent = %state.opponent,
            role = our_role.as_str(),
            lineup = state.lineup.len(),
            "Game started"
        );
        self.game_book = StatBook::new();
        self.undo.clear();
        Ok(self.game.insert(state))
    }

    pub fn submit_plate_appearance(&mut self, pa: &PlateAppearance) -> Result<&GameState, ScoringError> {
        self.submit_plate_appearance_at(pa, Local::now().naive_local())
    }

    /// Record one of our plate appearances with an explicit log timestamp.
    pub fn submit_plate_appearance_at(
        &mut self,
        pa: &PlateAppearance,
        timestamp: NaiveDateTime,
    ) -> Result<&GameState, ScoringError> {
        let game = self.game.as_ref().ok_or(ScoringError::NoActiveGame)?;
        if !self.roster.contains(&pa.batter) {
            return Err(ScoringError::PlayerNotInRoster(pa.batter.display_label()));
        }
        let (next, event) = game.plate_appearance(pa, timestamp)?;

        self.stores.events.append(&event)?;
        let mut season_book = self.season_book.clone();
        season_book.apply(&event);
        if let Err(e) = self.stores.stats.replace(season_book.rows()) {
            if let Err(rollback) = self.stores.events.truncate_last() {
                error!(error = %rollback, "Failed to roll back event log after stats write failure");
            }
            return Err(e.into());
        }

        self.undo.push(game, true);
        self.season_book = season_book;
        self.game_book.apply(&event);
        info!(
            batter = %pa.batter.display_label(),
            outcome = %event.outcome,
            rbis = event.rbis,
            inning = next.inning,
            outs = next.outs,
            "Plate appearance recorded"
        );
        Ok(self.game.insert(next))
    }

    /// Record the opponent's half as a run total. `outs` is for the log only.
    pub fn submit_opponent_half(&mut self, runs: u32, outs: u8) -> Result<&GameState, ScoringError> {
        let game = self.game.as_ref().ok_or(ScoringError::NoActiveGame)?;
        let next = game.opponent_half(runs)?;
        self.undo.push(game, false);
        info!(
            inning = game.inning,
            half = game.half.as_str(),
            runs,
            outs,
            "Opponent half recorded"
        );
        Ok(self.game.insert(next))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Roll back the most recent plate appearance or opponent half.
    ///
    /// Stats are rebuilt by replaying the remaining log rather than by
    /// reversing the undone event.
    pub fn undo(&mut self) -> Result<&GameState, ScoringError> {
        let logged_event = match self.undo.peek() {
            Some(snapshot) => snapshot.logged_event,
            None => return Err(ScoringError::NothingToUndo),
        };
        let removed = if logged_event {
            self.stores.events.truncate_last()?
        } else {
            None
        };
        let snapshot = self.undo.pop().ok_or(ScoringError::NothingToUndo)?;
        self.game = Some(snapshot.state);

        if logged_event {
            self.rebuild_from_log()?;
        }
        info!(
            removed_event = removed.as_ref().map(|e| e.outcome.as_str()).unwrap_or("none"),
            remaining_undo = self.undo.len(),
            "Undo applied"
        );
        self.live()
    }

    /// Replay the log into both stat books and persist the cumulative one.
    fn rebuild_from_log(&mut self) -> Result<(), ScoringError> {
        let events = self.stores.events.load()?;
        self.season_book = aggregate(&events);
        self.game_book = match &self.game {
            Some(game) => aggregate(
                events
                    .iter()
                    .skip(self.log_start)
                    .filter(|e| e.belongs_to(game.game_date, &game.opponent)),
            ),
            None => StatBook::new(),
        };
        self.stores.stats.replace(self.season_book.rows())?;
        Ok(())
    }

    /// Finalize the game: write its season record and fold this game's
    /// counting stats into the historical source.
    pub fn end_game(&mut self) -> Result<SeasonGameRecord, ScoringError> {
        let game = self.game.as_ref().ok_or(ScoringError::NoActiveGame)?;
        let score = game.finish();
        let record = SeasonGameRecord::from_final(game.game_date, &game.opponent, game.our_role, &score);

        self.stores.season.append(&record)?;
        if let Err(e) = self.merge_game_stats() {
            if let Err(rollback) = self.stores.season.truncate_last() {
                error!(error = %rollback, "Failed to roll back season record after stats merge failure");
            }
            return Err(e.into());
        }

        info!(
            date = %record.date,
            opponent = %record.opponent,
            ltp_runs = record.ltp_runs,
            opp_runs = record.opp_runs,
            result = record.result.as_str(),
            "Game ended"
        );
        self.clear_live_game();
        Ok(record)
    }

    fn merge_game_stats(&self) -> Result<()> {
        let mut rows = self.stores.season_stats.load()?;
        for stats in self.game_book.rows() {
            merge_delta(&mut rows, &HistoricalLine::from(stats));
        }
        self.stores.season_stats.replace(&rows)?;
        info!(players = self.game_book.rows().len(), "Merged game stats into season totals");
        Ok(())
    }

    /// Abandon the live game. Events it logged are purged and stats replayed,
    /// so an abandoned game leaves no trace.
    pub fn reset_game(&mut self) -> Result<(), ScoringError> {
        let Some(game) = self.game.take() else {
            return Ok(());
        };
        let mut events = self.stores.events.load()?;
        let purged = events.len().saturating_sub(self.log_start);
        if purged > 0 {
            events.truncate(self.log_start);
            self.stores.events.replace(&events)?;
        }
        self.clear_live_game();
        self.rebuild_from_log()?;
        info!(
            date = %game.game_date,
            opponent = %game.opponent,
            purged_events = purged,
            "Game reset"
        );
        Ok(())
    }

    fn clear_live_game(&mut self) {
        self.game = None;
        self.game_book = StatBook::new();
        self.undo.clear();
    }

    pub fn scoreboard(&self) -> Option<Scoreboard> {
        let game = self.game.as_ref()?;
        let (ltp_runs, opp_runs) = game.totals();
        let batter = game.current_batter();
        Some(Scoreboard {
            game: game.clone(),
            current_batter: batter.cloned(),
            current_batter_stats: batter.and_then(|p| self.season_book.get(p)).cloned(),
            ltp_runs,
            opp_runs,
            can_undo: self.can_undo(),
        })
    }

    // ── Stats ──────────────────────────────────────────────────────────────

    /// Cumulative stats, in order of each player's first logged appearance.
    pub fn player_stats(&self) -> &[PlayerStats] {
        self.season_book.rows()
    }

    /// Stats for the game in progress.
    pub fn game_stats(&self) -> &[PlayerStats] {
        self.game_book.rows()
    }

    // ── Season history ─────────────────────────────────────────────────────

    /// Finalized games, newest first, each with its store index.
    pub fn season_records(&self) -> Result<Vec<(usize, SeasonGameRecord)>, ScoringError> {
        Ok(newest_first(&self.stores.season.load()?))
    }

    pub fn season_summary(&self) -> Result<SeasonSummary, ScoringError> {
        Ok(SeasonSummary::from_records(&self.stores.season.load()?))
    }

    /// Edit a finalized game. A changed date or opponent is carried onto the
    /// game's logged plate appearances so a later delete still finds them.
    pub fn edit_season_record(
        &mut self,
        index: usize,
        edit: &SeasonEdit,
    ) -> Result<SeasonGameRecord, ScoringError> {
        let original = self.stores.season.load()?;
        let mut records = original.clone();
        let record = records
            .get_mut(index)
            .ok_or(ScoringError::SeasonRecordNotFound(index))?;
        let (old_date, old_opponent) = (record.date, record.opponent.clone());
        record.apply_edit(edit);
        let edited = record.clone();
        self.stores.season.replace(&records)?;

        let mut rekeyed = 0;
        if edited.date != old_date || edited.opponent != old_opponent {
            let mut events = self.stores.events.load()?;
            for event in events.iter_mut().take(self.log_start) {
                if event.belongs_to(old_date, &old_opponent) {
                    event.game_date = edited.date;
                    event.opponent = edited.opponent.clone();
                    rekeyed += 1;
                }
            }
            if rekeyed > 0 {
                if let Err(e) = self.stores.events.replace(&events) {
                    if let Err(rollback) = self.stores.season.replace(&original) {
                        error!(error = %rollback, "Failed to roll back season record after event rewrite failure");
                    }
                    return Err(e.into());
                }
            }
        }

        info!(
            index,
            date = %edited.date,
            opponent = %edited.opponent,
            result = edited.result.as_str(),
            rekeyed_events = rekeyed,
            "Season record edited"
        );
        Ok(edited)
    }

    /// Delete a finalized game together with every plate appearance logged
    /// for its date and opponent, then replay the remaining log. The live
    /// game's own events are never touched, even on a doubleheader.
    pub fn delete_season_record(&mut self, index: usize) -> Result<SeasonGameRecord, ScoringError> {
        let mut records = self.stores.season.load()?;
        if index >= records.len() {
            return Err(ScoringError::SeasonRecordNotFound(index));
        }
        let removed = records.remove(index);

        let events = self.stores.events.load()?;
        let mut kept = Vec::with_capacity(events.len());
        let mut purged = 0;
        for (i, event) in events.into_iter().enumerate() {
            if i < self.log_start && event.belongs_to(removed.date, &removed.opponent) {
                purged += 1;
            } else {
                kept.push(event);
            }
        }

        self.stores.events.replace(&kept)?;
        self.stores.season.replace(&records)?;
        self.log_start -= purged;
        self.rebuild_from_log()?;

        info!(
            index,
            date = %removed.date,
            opponent = %removed.opponent,
            purged_events = purged,
            "Season record deleted"
        );
        Ok(removed)
    }

    // ── Historical stats and odds ──────────────────────────────────────────

    /// Multi-season totals by full name: the merged season table plus every
    /// configured past-season export. Unreadable exports are skipped.
    pub fn historical_summary(&self) -> Result<BTreeMap<String, HistoricalLine>, ScoringError> {
        let mut lines = self.stores.season_stats.load()?;
        for path in &self.history_paths {
            match historical::import_csv(path) {
                Ok(imported) => lines.extend(imported),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable historical stats"),
            }
        }
        Ok(summarize(&lines))
    }

    /// Odds table for the roster player with the given display label.
    /// A player with no history gets an empty table.
    pub fn odds_for(&self, label: &str) -> Result<PlayerOdds, ScoringError> {
        let player = self.player_by_label(label)?;
        let name = player.full_name();
        let line = self
            .historical_summary()?
            .remove(&name)
            .unwrap_or_else(|| HistoricalLine::zero(&name));
        let odds = compute_odds(&line);
        Ok(PlayerOdds { player, line, odds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use crate::scoring::game::RunnerMove;
    use crate::scoring::odds::OddsOutcome;
    use crate::scoring::outcome::{Base, BatterFate, GameResult, Outcome, RunnerFate, Side};
    use approx::assert_relative_eq;
    use chrono::NaiveTime;

    fn ava() -> Player {
        Player::new("Ava", "Reyes", 3)
    }

    fn bo() -> Player {
        Player::new("Bo", "Lee", 7)
    }

    fn roster() -> Arc<dyn RosterProvider> {
        Arc::new(Roster::new(vec![ava(), bo()]))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn at(minute: u32) -> NaiveDateTime {
        day(8).and_time(NaiveTime::from_hms_opt(19, minute, 0).unwrap())
    }

    fn scorer() -> Scorer {
        Scorer::open(roster(), Stores::memory(), Vec::new()).unwrap()
    }

    fn play(batter: Player, outcome: Outcome, batter_fate: BatterFate) -> PlateAppearance {
        PlateAppearance {
            batter,
            outcome,
            runners: Vec::new(),
            batter_fate,
            runs_scored: 0,
        }
    }

    fn event_count(s: &Scorer) -> usize {
        s.stores.events.load().unwrap().len()
    }

    #[test]
    fn start_requires_a_roster() {
        let mut s = Scorer::open(Arc::new(Roster::default()), Stores::memory(), Vec::new()).unwrap();
        let err = s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap_err();
        assert!(matches!(err, ScoringError::EmptyRoster));
        assert!(s.game().is_none());
    }

    #[test]
    fn empty_lineup_bats_the_whole_roster() {
        let mut s = scorer();
        let game = s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        assert_eq!(game.lineup, vec![ava(), bo()]);
    }

    #[test]
    fn lineup_must_come_from_the_roster() {
        let mut s = scorer();
        let err = s
            .start_game(day(8), "Hawks", Role::Away, vec![Player::new("Cy", "Young", 1)])
            .unwrap_err();
        assert!(matches!(err, ScoringError::PlayerNotInRoster(_)));
    }

    #[test]
    fn second_start_is_refused() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let err = s.start_game(day(8), "Owls", Role::Home, Vec::new()).unwrap_err();
        assert!(matches!(err, ScoringError::GameInProgress));
    }

    #[test]
    fn batter_off_the_roster_is_refused_before_logging() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let before = s.game().cloned();
        let err = s
            .submit_plate_appearance_at(&play(Player::new("Cy", "Young", 1), Outcome::Single, BatterFate::Reaches(Base::First)), at(1))
            .unwrap_err();
        assert!(matches!(err, ScoringError::PlayerNotInRoster(_)));
        assert_eq!(s.game().cloned(), before);
        assert_eq!(event_count(&s), 0);
        assert!(!s.can_undo());
    }

    #[test]
    fn plate_appearance_logs_and_updates_stats() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let game = s
            .submit_plate_appearance_at(&play(ava(), Outcome::Double, BatterFate::Reaches(Base::Second)), at(1))
            .unwrap();
        assert_eq!(game.current_batter(), Some(&bo()));
        assert_eq!(event_count(&s), 1);

        let stats = &s.player_stats()[0];
        assert_eq!((stats.pa, stats.ab, stats.doubles), (1, 1, 1));
        assert_relative_eq!(stats.slg, 2.0);
        assert_eq!(s.stores.stats.load().unwrap(), s.player_stats().to_vec());
        assert_eq!(s.game_stats().len(), 1);
    }

    #[test]
    fn scoreboard_shows_runs_and_the_batter_due_up() {
        let mut s = scorer();
        assert!(s.scoreboard().is_none());
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let mut hr = play(ava(), Outcome::HomeRun, BatterFate::Scores);
        hr.runs_scored = 1;
        s.submit_plate_appearance_at(&hr, at(1)).unwrap();
        s.submit_plate_appearance_at(&play(bo(), Outcome::Out, BatterFate::Out), at(2))
            .unwrap();

        let board = s.scoreboard().unwrap();
        assert_eq!((board.ltp_runs, board.opp_runs), (1, 0));
        assert_eq!(board.current_batter, Some(ava()));
        assert_eq!(board.current_batter_stats.map(|r| r.home_runs), Some(1));
        assert!(board.can_undo);
    }

    #[test]
    fn undo_restores_state_log_and_stats() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        s.submit_plate_appearance_at(&play(ava(), Outcome::Single, BatterFate::Reaches(Base::First)), at(1))
            .unwrap();
        let before = s.game().cloned().unwrap();
        let stats_before = s.player_stats().to_vec();

        let mut second = play(bo(), Outcome::HomeRun, BatterFate::Scores);
        second.runners = vec![RunnerMove {
            from: Base::First,
            fate: RunnerFate::Scores,
        }];
        second.runs_scored = 2;
        s.submit_plate_appearance_at(&second, at(2)).unwrap();
        assert_eq!(event_count(&s), 2);

        let restored = s.undo().unwrap().clone();
        assert_eq!(restored, before);
        assert_eq!(event_count(&s), 1);
        assert_eq!(s.player_stats(), stats_before.as_slice());
        assert_eq!(s.game_stats().len(), 1);
        assert!(s.can_undo());
    }

    /// Stats table whose writes start failing once `fail` is set.
    struct FlakyStats {
        inner: MemoryTable<PlayerStats>,
        fail: Arc<std::sync::atomic::AtomicBool>,
    }

    impl TableStore<PlayerStats> for FlakyStats {
        fn load(&self) -> Result<Vec<PlayerStats>> {
            self.inner.load()
        }

        fn append(&self, row: &PlayerStats) -> Result<()> {
            self.inner.append(row)
        }

        fn replace(&self, rows: &[PlayerStats]) -> Result<()> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.inner.replace(rows)
        }

        fn truncate_last(&self) -> Result<Option<PlayerStats>> {
            self.inner.truncate_last()
        }
    }

    #[test]
    fn failed_stats_write_rolls_back_the_log() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut stores = Stores::memory();
        stores.stats = Box::new(FlakyStats {
            inner: MemoryTable::new(),
            fail: fail.clone(),
        });
        let mut s = Scorer::open(roster(), stores, Vec::new()).unwrap();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let before = s.game().cloned();

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = s
            .submit_plate_appearance_at(&play(ava(), Outcome::Single, BatterFate::Reaches(Base::First)), at(1))
            .unwrap_err();
        assert!(!err.is_precondition());
        assert_eq!(event_count(&s), 0);
        assert_eq!(s.game().cloned(), before);
        assert!(s.player_stats().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn undoing_an_opponent_half_keeps_the_log() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Home, Vec::new()).unwrap();
        let before = s.game().cloned().unwrap();
        s.submit_opponent_half(3, 3).unwrap();
        assert_eq!(s.game().unwrap().offense, Side::Us);

        assert_eq!(s.undo().unwrap(), &before);
        assert_eq!(event_count(&s), 0);
        assert!(matches!(s.undo().unwrap_err(), ScoringError::NothingToUndo));
    }

    #[test]
    fn end_game_writes_record_and_merges_history() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        let mut hr = play(ava(), Outcome::HomeRun, BatterFate::Scores);
        hr.runs_scored = 1;
        s.submit_plate_appearance_at(&hr, at(1)).unwrap();
        s.submit_plate_appearance_at(&play(bo(), Outcome::Walk, BatterFate::Reaches(Base::First)), at(2))
            .unwrap();

        let record = s.end_game().unwrap();
        assert_eq!((record.ltp_runs, record.opp_runs, record.result), (1, 0, GameResult::W));
        assert!(s.game().is_none());
        assert!(!s.can_undo());

        let summary = s.historical_summary().unwrap();
        assert_eq!((summary["Ava Reyes"].pa, summary["Ava Reyes"].home_runs), (1, 1));
        assert_eq!(summary["Bo Lee"].walks, 1);
        assert_eq!(s.season_summary().unwrap().record_label(), "1-0-0");
    }

    #[test]
    fn end_game_without_a_game_is_refused() {
        let mut s = scorer();
        assert!(matches!(s.end_game().unwrap_err(), ScoringError::NoActiveGame));
    }

    #[test]
    fn reset_purges_the_abandoned_game() {
        let mut s = scorer();
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        s.submit_plate_appearance_at(&play(ava(), Outcome::Single, BatterFate::Reaches(Base::First)), at(1))
            .unwrap();
        s.reset_game().unwrap();
        assert!(s.game().is_none());
        assert_eq!(event_count(&s), 0);
        assert!(s.player_stats().is_empty());
    }

    fn finish_game(s: &mut Scorer, date: NaiveDate, opponent: &str, outcome: Outcome) {
        s.start_game(date, opponent, Role::Away, Vec::new()).unwrap();
        let fate = if outcome == Outcome::Strikeout {
            BatterFate::Out
        } else {
            BatterFate::Reaches(Base::First)
        };
        s.submit_plate_appearance_at(&play(ava(), outcome, fate), date.and_hms_opt(19, 0, 0).unwrap())
            .unwrap();
        s.end_game().unwrap();
    }

    #[test]
    fn delete_cascades_to_events_and_replays_stats() {
        let mut s = scorer();
        finish_game(&mut s, day(1), "Hawks", Outcome::Single);
        finish_game(&mut s, day(8), "Owls", Outcome::Strikeout);
        finish_game(&mut s, day(15), "Hawks", Outcome::Walk);

        let removed = s.delete_season_record(1).unwrap();
        assert_eq!(removed.opponent, "Owls");

        let events = s.stores.events.load().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.opponent == "Hawks"));
        assert_eq!(s.player_stats(), aggregate(&events).rows());
        assert_eq!(s.player_stats()[0].strikeouts, 0);
        assert_eq!(s.season_records().unwrap().len(), 2);
    }

    #[test]
    fn delete_unknown_record_is_refused() {
        let mut s = scorer();
        assert!(matches!(
            s.delete_season_record(0).unwrap_err(),
            ScoringError::SeasonRecordNotFound(0)
        ));
    }

    #[test]
    fn doubleheader_delete_leaves_the_live_game_alone() {
        let mut s = scorer();
        finish_game(&mut s, day(1), "Owls", Outcome::Strikeout);
        finish_game(&mut s, day(8), "Hawks", Outcome::Single);
        s.start_game(day(8), "Hawks", Role::Away, Vec::new()).unwrap();
        s.submit_plate_appearance_at(&play(ava(), Outcome::Walk, BatterFate::Reaches(Base::First)), at(5))
            .unwrap();

        let removed = s.delete_season_record(1).unwrap();
        assert_eq!((removed.date, removed.opponent.as_str()), (day(8), "Hawks"));

        let events = s.stores.events.load().unwrap();
        let outcomes: Vec<Outcome> = events.iter().map(|e| e.outcome).collect();
        assert_eq!(outcomes, vec![Outcome::Strikeout, Outcome::Walk]);
        assert_eq!(s.game_stats().len(), 1);
        assert_eq!(s.game_stats()[0].walks, 1);

        s.undo().unwrap();
        let events = s.stores.events.load().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].opponent.as_str(), events[0].outcome), ("Owls", Outcome::Strikeout));
        assert!(s.game_stats().is_empty());
    }

    #[test]
    fn edited_date_and_opponent_follow_the_events_into_delete() {
        let mut s = scorer();
        finish_game(&mut s, day(1), "Hawks", Outcome::Single);
        finish_game(&mut s, day(8), "Owls", Outcome::Walk);
        s.edit_season_record(
            0,
            &SeasonEdit {
                date: Some(day(2)),
                opponent: Some("Falcons".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let events = s.stores.events.load().unwrap();
        assert!(events[0].belongs_to(day(2), "Falcons"));
        assert!(events[1].belongs_to(day(8), "Owls"));

        s.delete_season_record(0).unwrap();
        let events = s.stores.events.load().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(s.player_stats()[0].singles, 0);
        assert_eq!(s.player_stats()[0].walks, 1);
    }

    #[test]
    fn edit_recomputes_result_in_the_store() {
        let mut s = scorer();
        finish_game(&mut s, day(1), "Hawks", Outcome::Single);
        let edited = s
            .edit_season_record(
                0,
                &SeasonEdit {
                    opp_runs: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(edited.result, GameResult::L);
        assert_eq!(s.season_records().unwrap()[0].1.result, GameResult::L);
    }

    #[test]
    fn season_listing_is_newest_first() {
        let mut s = scorer();
        finish_game(&mut s, day(8), "Owls", Outcome::Single);
        finish_game(&mut s, day(1), "Hawks", Outcome::Single);
        let listed: Vec<usize> = s.season_records().unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(listed, vec![0, 1]);
    }

    #[test]
    fn open_rebuilds_stale_stats_from_the_log() {
        let stores = Stores::memory();
        let event = PlateAppearanceEvent {
            timestamp: at(1),
            game_date: day(8),
            opponent: "Hawks".into(),
            inning: 1,
            half: crate::scoring::outcome::Half::Top,
            first_name: "Ava".into(),
            last_name: "Reyes".into(),
            jersey_number: 3,
            outcome: Outcome::Triple,
            rbis: 2,
        };
        stores.events.append(&event).unwrap();
        stores.stats.replace(&[PlayerStats::empty(&bo())]).unwrap();

        let s = Scorer::open(roster(), stores, Vec::new()).unwrap();
        assert_eq!(s.player_stats().len(), 1);
        assert_eq!(s.player_stats()[0].triples, 1);
        assert_eq!(s.stores.stats.load().unwrap(), s.player_stats().to_vec());
    }

    #[test]
    fn odds_join_history_by_full_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let past = dir.path().join("2024.csv");
        std::fs::write(&past, "Name,PA,1B,2B,3B,HR,BB,K\nAva Reyes,9,3,0,0,1,1,2\nTotals,9,3,0,0,1,1,2\n").unwrap();
        let mut s = Scorer::open(roster(), Stores::memory(), vec![past, dir.path().join("missing.csv")]).unwrap();
        finish_game(&mut s, day(1), "Hawks", Outcome::Single);

        let odds = s.odds_for("Ava Reyes (#3)").unwrap();
        assert_eq!(odds.line.pa, 10);
        assert_eq!(odds.line.singles, 4);
        let single = odds.odds.iter().find(|r| r.outcome == OddsOutcome::Single).unwrap();
        assert_relative_eq!(single.probability, 40.0);
        assert_eq!(single.american_odds, Some(150));

        let empty = s.odds_for("Bo Lee (#7)").unwrap();
        assert!(empty.odds.is_empty());
        assert!(matches!(s.odds_for("Nobody (#0)").unwrap_err(), ScoringError::PlayerNotInRoster(_)));
    }

    #[test]
    fn csv_stores_survive_a_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let mut s = Scorer::open(roster(), Stores::csv(dir.path()), Vec::new()).unwrap();
            finish_game(&mut s, day(1), "Hawks", Outcome::Triple);
        }
        assert!(dir.path().join(EVENT_LOG_CSV).exists());
        assert!(dir.path().join(SEASON_STATS_CSV).exists());

        let s = Scorer::open(roster(), Stores::csv(dir.path()), Vec::new()).unwrap();
        assert_eq!(s.player_stats()[0].triples, 1);
        assert_eq!(s.season_records().unwrap().len(), 1);
        assert_eq!(s.historical_summary().unwrap()["Ava Reyes"].triples, 1);
    }

    #[test]
    fn sqlite_stores_share_one_database() {
        let db = Database::open_in_memory().unwrap();
        {
            let mut s = Scorer::open(roster(), Stores::sqlite(&db), Vec::new()).unwrap();
            finish_game(&mut s, day(1), "Hawks", Outcome::Walk);
        }
        let s = Scorer::open(roster(), Stores::sqlite(&db), Vec::new()).unwrap();
        assert_eq!(s.player_stats()[0].walks, 1);
        assert_eq!(s.season_summary().unwrap().ties, 1);
    }
}
