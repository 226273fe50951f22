//! Scenario tests for the block solver.

use super::*;
use crate::domain::{StopTime, TimePoint, Train};

fn t(s: &str) -> TimePoint {
    TimePoint::parse(s).unwrap()
}

/// A train calling at `from` and `to`, heading for `destination`.
fn train(id: &str, from: (&str, &str), to: (&str, &str), destination: &str) -> Train {
    let route = id.rsplit_once('.').map(|(r, _)| r).unwrap_or(id);
    let mut train = Train::new(id, route, "Weekday");
    train.stop_times = vec![
        StopTime::new(from.0, t(from.1), t(from.1)),
        StopTime::new(to.0, t(to.1), t(to.1)),
    ];
    train.destinations = vec![destination.to_string()];
    train
}

fn ids(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

fn linked(mut train: Train, previous: &[&str], next: &[&str]) -> Train {
    train.previous = ids(previous);
    train.next = ids(next);
    train
}

fn solve(trains: &[Train]) -> SolveReport {
    let mut solver = BlockSolver::new("G");
    for train in trains {
        solver.add_train(train);
    }
    solver.solve()
}

fn block_trips(report: &SolveReport) -> Vec<Vec<String>> {
    report.blocks.iter().map(Block::trip_ids).collect()
}

#[test]
fn flat_chain_with_declared_links() {
    let ebina = "Sotetsu.Main.Ebina";
    let trains = vec![
        linked(
            train("Sotetsu.Main.6225", ("Sotetsu.Main.Nishiya", "09:40"), (ebina, "09:55"), ebina),
            &["Sotetsu.SotetsuShinYokohama.6225"],
            &[],
        ),
        linked(
            train("JR-East.SaikyoKawagoe.225M", ("JR-East.SaikyoKawagoe.Omiya", "08:30"), ("JR-East.SaikyoKawagoe.Osaki", "09:10"), ebina),
            &[],
            &["JR-East.SotetsuDirect.225M"],
        ),
        linked(
            train("Sotetsu.SotetsuShinYokohama.6225", ("Sotetsu.SotetsuShinYokohama.HazawaYokohamaKokudai", "09:30"), ("Sotetsu.SotetsuShinYokohama.Nishiya", "09:38"), ebina),
            &["JR-East.SotetsuDirect.225M"],
            &["Sotetsu.Main.6225"],
        ),
        linked(
            train("JR-East.SotetsuDirect.225M", ("JR-East.SotetsuDirect.Osaki", "09:12"), ("JR-East.SotetsuDirect.HazawaYokohamaKokudai", "09:28"), ebina),
            &["JR-East.SaikyoKawagoe.225M"],
            &["Sotetsu.SotetsuShinYokohama.6225"],
        ),
    ];

    let report = solve(&trains);

    assert!(report.rejected.is_empty());
    assert_eq!(
        block_trips(&report),
        vec![vec![
            "JR-East.SaikyoKawagoe.225M".to_string(),
            "JR-East.SotetsuDirect.225M".to_string(),
            "Sotetsu.SotetsuShinYokohama.6225".to_string(),
            "Sotetsu.Main.6225".to_string(),
        ]]
    );
    assert_eq!(report.blocks[0].id, "G.0");
    assert_eq!(report.consumed, 4);
    assert!(report.blocks[0].members.iter().all(|m| m.destinations == vec![ebina.to_string()]));
}

#[test]
fn two_trains_with_declared_links() {
    let trains = vec![
        linked(train("1", ("A", "10:00"), ("B", "10:10"), "C"), &[], &["2"]),
        linked(train("2", ("B", "10:12"), ("C", "10:20"), "C"), &["1"], &[]),
    ];

    let report = solve(&trains);
    assert_eq!(block_trips(&report), vec![vec!["1".to_string(), "2".to_string()]]);
    assert_eq!(report.blocks[0].id, "G.0");
}

#[test]
fn split_clones_shared_leg() {
    let hakone = "HakoneTozan.HakoneTozan.HakoneYumoto";
    let enoshima = "Odakyu.Enoshima.KataseEnoshima";
    let both = [hakone, enoshima];

    let mut chiyoda = linked(
        train("TokyoMetro.Chiyoda.A1003E", ("TokyoMetro.Chiyoda.KitaSenju", "07:00"), ("TokyoMetro.Chiyoda.YoyogiUehara", "07:40"), hakone),
        &[],
        &["Odakyu.Odawara.6505"],
    );
    chiyoda.destinations = both.iter().map(|s| s.to_string()).collect();
    let mut trunk = linked(
        train("Odakyu.Odawara.6505", ("Odakyu.Odawara.YoyogiUehara", "07:41"), ("Odakyu.Odawara.SagamiOno", "08:20"), hakone),
        &["TokyoMetro.Chiyoda.A1003E"],
        &["Odakyu.Odawara.493", "Odakyu.Enoshima.593"],
    );
    trunk.destinations = chiyoda.destinations.clone();

    let trains = vec![
        chiyoda,
        trunk,
        linked(
            train("Odakyu.Odawara.493", ("Odakyu.Odawara.SagamiOno", "08:22"), ("HakoneTozan.HakoneTozan.HakoneYumoto", "09:30"), hakone),
            &["Odakyu.Odawara.6505"],
            &[],
        ),
        linked(
            train("Odakyu.Enoshima.593", ("Odakyu.Enoshima.SagamiOno", "08:23"), (enoshima, "09:05"), enoshima),
            &["Odakyu.Odawara.6505"],
            &[],
        ),
    ];

    let report = solve(&trains);
    assert!(report.rejected.is_empty());
    assert_eq!(report.blocks.len(), 2);

    let first = &report.blocks[0];
    assert_eq!(
        first.trip_ids(),
        vec!["TokyoMetro.Chiyoda.A1003E", "Odakyu.Odawara.6505", "Odakyu.Enoshima.593"]
    );
    assert!(first.members.iter().all(|m| m.destinations == vec![enoshima.to_string()]));

    let second = &report.blocks[1];
    assert_eq!(
        second.trip_ids(),
        vec!["TokyoMetro.Chiyoda.A1003E.2", "Odakyu.Odawara.6505.2", "Odakyu.Odawara.493"]
    );
    assert!(second.members[0].is_clone());
    assert!(!second.members[2].is_clone());
    assert!(second.members.iter().all(|m| m.destinations == vec![hakone.to_string()]));
}

#[test]
fn join_clones_shared_leg() {
    let narita = "JR-East.SobuRapid.NaritaAirportTerminal1";
    let trains = vec![
        linked(
            train("JR-East.ShonanShinjuku.2201M", ("JR-East.ShonanShinjuku.Omiya", "06:00"), ("JR-East.ShonanShinjuku.Shinjuku", "06:30"), narita),
            &[],
            &["JR-East.SobuRapid.2001M"],
        ),
        linked(
            train("JR-East.Yokosuka.2001M", ("JR-East.Yokosuka.Ofuna", "06:00"), ("JR-East.Yokosuka.Tokyo", "06:45"), narita),
            &[],
            &["JR-East.SobuRapid.2001M"],
        ),
        linked(
            train("JR-East.SobuRapid.2001M", ("JR-East.SobuRapid.Tokyo", "06:50"), (narita, "08:00"), narita),
            &["JR-East.Yokosuka.2001M", "JR-East.ShonanShinjuku.2201M"],
            &[],
        ),
    ];

    let report = solve(&trains);
    assert!(report.rejected.is_empty());
    assert_eq!(
        block_trips(&report),
        vec![
            vec!["JR-East.ShonanShinjuku.2201M".to_string(), "JR-East.SobuRapid.2001M".to_string()],
            vec!["JR-East.Yokosuka.2001M".to_string(), "JR-East.SobuRapid.2001M.2".to_string()],
        ]
    );
    assert_eq!(report.blocks[1].id, "G.1");
}

#[test]
fn two_forks_rejected() {
    let trains = vec![
        linked(train("A", ("S1", "10:00"), ("S2", "10:10"), "X"), &[], &["B", "C"]),
        linked(train("B", ("S2", "10:11"), ("S3", "10:20"), "X"), &["A"], &[]),
        linked(train("C", ("S2", "10:12"), ("S4", "10:20"), "X"), &["A"], &["D", "E"]),
        linked(train("D", ("S4", "10:21"), ("S5", "10:30"), "X"), &["C"], &[]),
        linked(train("E", ("S4", "10:22"), ("S6", "10:30"), "X"), &["C"], &[]),
    ];

    let report = solve(&trains);
    assert!(report.blocks.is_empty());
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].seed, "A");
    assert_eq!(
        report.rejected[0].error,
        BlockError::TooManyForks {
            seed: "A".into(),
            forks: 2
        }
    );
    assert_eq!(report.consumed, 5);
}

#[test]
fn split_and_join_on_one_train_rejected() {
    let trains = vec![
        linked(train("A", ("S1", "10:00"), ("S2", "10:10"), "X"), &[], &["C"]),
        linked(train("B", ("S0", "10:00"), ("S2", "10:10"), "X"), &[], &["C"]),
        linked(train("C", ("S2", "10:12"), ("S3", "10:20"), "X"), &["A", "B"], &["D", "E"]),
        linked(train("D", ("S3", "10:21"), ("S4", "10:30"), "X"), &["C"], &[]),
        linked(train("E", ("S3", "10:22"), ("S5", "10:30"), "X"), &["C"], &[]),
    ];

    let report = solve(&trains);
    assert!(report.blocks.is_empty());
    assert!(matches!(report.rejected[0].error, BlockError::TooManyForks { forks: 2, .. }));
}

#[test]
fn circular_reference_rejects_component_only() {
    let trains = vec![
        linked(train("A", ("S1", "10:00"), ("S2", "10:10"), "X"), &["B"], &["B"]),
        linked(train("B", ("S2", "10:12"), ("S1", "10:20"), "X"), &["A"], &["A"]),
        linked(train("C", ("S7", "11:00"), ("S8", "11:10"), "Y"), &[], &["D"]),
        linked(train("D", ("S8", "11:12"), ("S9", "11:20"), "Y"), &["C"], &[]),
    ];

    let report = solve(&trains);
    assert_eq!(report.rejected.len(), 1);
    assert!(matches!(report.rejected[0].error, BlockError::CircularReference { .. }));
    assert_eq!(report.rejected[0].trains.len(), 2);
    assert_eq!(block_trips(&report), vec![vec!["C".to_string(), "D".to_string()]]);
}

#[test]
fn signature_match_links_undeclared_trains() {
    let rinkan = "Tokyu.DenEnToshi.ChuoRinkan";
    let trains = vec![
        train("TokyoMetro.Hanzomon.A0800", ("TokyoMetro.Hanzomon.Oshiage", "08:00"), ("TokyoMetro.Hanzomon.Shibuya", "08:30"), rinkan),
        train("Tokyu.DenEnToshi.0800", ("Tokyu.DenEnToshi.Shibuya", "08:30"), (rinkan, "09:20"), rinkan),
    ];

    let report = solve(&trains);
    assert_eq!(
        block_trips(&report),
        vec![vec!["TokyoMetro.Hanzomon.A0800".to_string(), "Tokyu.DenEnToshi.0800".to_string()]]
    );
}

#[test]
fn ambiguous_signature_resolves_to_nothing() {
    let trains = vec![
        train("A.1", ("S1", "10:00"), ("S2", "10:10"), "S9"),
        train("B.1", ("S2", "10:10"), ("S3", "10:20"), "S9"),
        train("B.2", ("S2", "10:10"), ("S4", "10:20"), "S9"),
    ];

    let report = solve(&trains);
    assert!(report.blocks.is_empty());
    assert!(report.rejected.is_empty());
    assert_eq!(report.consumed, 3);
}

#[test]
fn terminating_train_is_not_matched_forward() {
    // A ends at its destination, so B starting there is a different service
    let trains = vec![
        train("A", ("S1", "10:00"), ("S2", "10:10"), "S2"),
        train("B", ("S2", "10:10"), ("S3", "10:20"), "S2"),
    ];

    let report = solve(&trains);
    assert!(report.blocks.is_empty());
    assert_eq!(report.consumed, 2);
}

#[test]
fn broken_reference_is_skipped() {
    let trains = vec![linked(train("A", ("S1", "10:00"), ("S2", "10:10"), "X"), &[], &["Ghost"])];
    let report = solve(&trains);
    assert!(report.blocks.is_empty());
    assert!(report.rejected.is_empty());
    assert_eq!(report.consumed, 1);
}

#[test]
fn self_contained_trains_skipped() {
    let mut solo = train("Solo", ("S1", "10:00"), ("S2", "10:10"), "S2");
    solo.origins = Some(vec!["S1".into()]);

    let mut solver = BlockSolver::new("G");
    solver.add_train(&solo);
    assert_eq!(solver.pending(), 0);

    let report = solver.solve();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.consumed, 0);
}

#[test]
fn block_numbers_continue_across_components() {
    let trains = vec![
        linked(train("A", ("S1", "10:00"), ("S2", "10:10"), "X"), &[], &["B"]),
        linked(train("B", ("S2", "10:12"), ("S3", "10:20"), "X"), &["A"], &[]),
        linked(train("C", ("S7", "11:00"), ("S8", "11:10"), "Y"), &[], &["D"]),
        linked(train("D", ("S8", "11:12"), ("S9", "11:20"), "Y"), &["C"], &[]),
    ];

    let report = solve(&trains);
    let ids: Vec<_> = report.blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["G.0", "G.1"]);
}

#[test]
fn assignment_tracks_clones_and_neighbours() {
    let trains = vec![
        linked(train("T", ("S1", "10:00"), ("S2", "10:10"), "X"), &[], &["L1", "L2"]),
        linked(train("L1", ("S2", "10:11"), ("S3", "10:20"), "S3"), &["T"], &[]),
        linked(train("L2", ("S2", "10:12"), ("S4", "10:20"), "S4"), &["T"], &[]),
    ];
    let report = solve(&trains);

    let mut assignment = BlockAssignment::default();
    assignment.record(&report);

    assert_eq!(assignment.block_ids("T"), vec!["G.0", "G.1"]);
    let memberships = assignment.memberships("T");
    assert_eq!(memberships[0].trip_id("T"), "T");
    assert_eq!(memberships[0].next.as_deref(), Some("L1"));
    assert_eq!(memberships[0].destinations, vec!["S3".to_string()]);
    assert_eq!(memberships[1].trip_id("T"), "T.2");
    assert_eq!(memberships[1].next.as_deref(), Some("L2"));
    assert_eq!(memberships[1].destinations, vec!["S4".to_string()]);

    assert_eq!(assignment.memberships("L2")[0].previous.as_deref(), Some("T.2"));
    assert!(assignment.memberships("Unknown").is_empty());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// Trains of several independent chains, linked explicitly.
    fn chains(lengths: &[usize]) -> Vec<Train> {
        let mut trains = Vec::new();
        for (c, &len) in lengths.iter().enumerate() {
            let id = |i: usize| format!("C{c:02}.T{i:02}");
            for i in 0..len {
                let minute = 10 + i as u32 * 2;
                let mut tr = train(
                    &id(i),
                    (&format!("C{c}.S{i}"), &format!("{:02}:{minute:02}", 6 + c)),
                    (&format!("C{c}.S{}", i + 1), &format!("{:02}:{:02}", 6 + c, minute + 1)),
                    &format!("C{c}.S{len}"),
                );
                tr.previous = Some(if i == 0 { vec![] } else { vec![id(i - 1)] });
                tr.next = Some(if i + 1 == len { vec![] } else { vec![id(i + 1)] });
                trains.push(tr);
            }
        }
        trains
    }

    proptest! {
        #[test]
        fn every_chain_becomes_one_ordered_block(
            lengths in prop::collection::vec(2usize..6, 1..6),
            seed in any::<u64>(),
        ) {
            let mut trains = chains(&lengths);
            // Insertion order must not matter
            let n = trains.len();
            for i in 0..n {
                let j = (seed.wrapping_mul(i as u64 + 7) % n as u64) as usize;
                trains.swap(i, j);
            }

            let report = solve(&trains);
            prop_assert!(report.rejected.is_empty());
            prop_assert_eq!(report.blocks.len(), lengths.len());
            prop_assert_eq!(report.consumed, n);

            let mut seen = HashSet::new();
            for block in &report.blocks {
                let trips = block.trip_ids();
                let mut sorted = trips.clone();
                sorted.sort();
                prop_assert_eq!(&trips, &sorted);
                for trip in trips {
                    prop_assert!(seen.insert(trip));
                }
            }
            prop_assert_eq!(seen.len(), n);
        }
    }
}
