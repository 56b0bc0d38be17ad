//! Global fixed-rate scheduler driving every started room

use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::util::time::{tick_duration, Timer, SIMULATION_TPS};
use crate::ws::protocol::ServerMsg;

use super::room::RoomRegistry;
use super::snapshot::GameStateSnapshot;
use super::state::Side;

/// Run the authoritative tick loop until the process shuts down
pub async fn run(registry: Arc<RoomRegistry>) {
    info!(tps = SIMULATION_TPS, "Tick loop started");

    let mut tick_interval = interval(tick_duration());
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick_interval.tick().await;

        let timer = Timer::new();
        let ticked = tick_all(&registry);
        let elapsed = timer.elapsed_micros();
        if elapsed > tick_duration().as_micros() as u64 {
            debug!(rooms = ticked, elapsed_micros = elapsed, "Tick overran its budget");
        }
    }
}

/// Step every started room once and push the resulting state to its seats.
/// Returns the number of rooms stepped.
pub fn tick_all(registry: &RoomRegistry) -> usize {
    let mut ticked = 0;

    for shared in registry.rooms() {
        let mut room = shared.lock();
        if !room.state.started {
            continue;
        }

        let outcome = room.tick();
        ticked += 1;

        if let Some(scorer) = outcome.goal {
            info!(
                room_code = %room.code(),
                scorer = ?scorer,
                score_a = room.state.score(Side::A),
                score_b = room.state.score(Side::B),
                "Goal"
            );
        }

        room.broadcast(&ServerMsg::GameState {
            state: GameStateSnapshot::from(&room.state),
        });
    }

    ticked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::SeatHandle;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[test]
    fn test_tick_all_only_steps_started_rooms() {
        let registry = RoomRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(16);
        let (tx_b, mut rx_b) = mpsc::channel(16);
        let (tx_c, mut rx_c) = mpsc::channel(16);

        registry
            .create("lone-wolf", SeatHandle::new(Uuid::new_v4(), tx_c))
            .unwrap();
        registry
            .create("two-dogs", SeatHandle::new(Uuid::new_v4(), tx_a))
            .unwrap();
        registry
            .join("two-dogs", SeatHandle::new(Uuid::new_v4(), tx_b))
            .unwrap();
        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            while rx.try_recv().is_ok() {}
        }

        assert_eq!(tick_all(&registry), 1);

        for rx in [&mut rx_a, &mut rx_b] {
            let frame = rx.try_recv().unwrap();
            let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(json["type"], "gameState");
            assert_eq!(json["state"]["gameStarted"], true);
        }
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_broadcasts_on_schedule() {
        let registry = Arc::new(RoomRegistry::new());
        let (tx_a, mut rx_a) = mpsc::channel(256);
        let (tx_b, _rx_b) = mpsc::channel(256);
        registry
            .create("fast-cat", SeatHandle::new(Uuid::new_v4(), tx_a))
            .unwrap();
        registry
            .join("fast-cat", SeatHandle::new(Uuid::new_v4(), tx_b))
            .unwrap();

        let task = tokio::spawn(run(registry.clone()));
        tokio::time::sleep(tick_duration() * 10).await;
        task.abort();

        let mut frames = 0;
        while rx_a.try_recv().is_ok() {
            frames += 1;
        }
        assert!(frames >= 5, "expected several state frames, got {frames}");
    }
}
