// parser/tests.rs

use super::*;
use std::io::Cursor;

fn records(text: &str, format: LogFormat) -> Vec<TimestepRecord> {
    parse(Cursor::new(text), format)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn headered_positions_group_under_headers() {
    let text = "# Timestep 0\n     0     1.00000000     2.00000000\n     1    -1.0    0.5\n\n\
                # Timestep 10\n0 1.5 2.5\n1 -1.5 0.0\n";
    let recs = records(text, LogFormat::HeaderedPosition);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].timestep, 0);
    assert_eq!(recs[1].timestep, 10);
    assert_eq!(recs[1].entries[0].id, Some(0));
    assert_eq!(recs[1].entries[0].position, DVec2::new(1.5, 2.5));
    assert_eq!(recs[0].entries[1].energy, None);
}

#[test]
fn noise_lines_are_dropped_not_fatal() {
    let text = "0 9 9\n# Timestep 1\n0 1 2\nthis is noise\n1 a 3\n2 1 2 3 4 5\n3 4 5\n# some comment\n";
    let mut parser = parse(Cursor::new(text), LogFormat::HeaderedPosition).unwrap();
    let rec = parser.next().unwrap().unwrap();
    assert!(parser.next().is_none());
    let ids: Vec<_> = rec.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(0), Some(3)]);
    // leading orphan line, prose, bad number, wrong width
    assert_eq!(parser.skipped_lines(), 4);
}

#[test]
fn empty_header_contributes_nothing() {
    let text = "# Timestep 3\n# Timestep 4\n0 1 1 2.0\n";
    let recs = records(text, LogFormat::HeaderedEnergy);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].timestep, 4);
}

#[test]
fn trailing_empty_header_is_not_flushed() {
    let text = "# Timestep 0\n0 0 0 1.0\n# Timestep 1\n";
    let recs = records(text, LogFormat::HeaderedEnergy);
    assert_eq!(recs.len(), 1);
}

#[test]
fn malformed_header_aborts_and_fuses() {
    let text = "# Timestep 0\n0 0 0\n# Timestep abc\n0 1 1\n";
    let mut parser = parse(Cursor::new(text), LogFormat::HeaderedPosition).unwrap();
    match parser.next() {
        Some(Err(VizError::MalformedHeader { line, text })) => {
            assert_eq!(line, 3);
            assert_eq!(text, "# Timestep abc");
        }
        other => panic!("expected malformed header, got {other:?}"),
    }
    assert!(parser.next().is_none());
}

#[test]
fn header_without_number_is_malformed() {
    let text = "# Timestep\n0 0 0\n";
    let result: Result<Vec<_>> = parse(Cursor::new(text), LogFormat::HeaderedPosition)
        .unwrap()
        .collect();
    assert!(matches!(result, Err(VizError::MalformedHeader { line: 1, .. })));
}

#[test]
fn out_of_order_timesteps_keep_stream_order() {
    let text = "# Timestep 5\n0 0 0\n# Timestep 2\n0 1 1\n";
    let steps: Vec<u64> = records(text, LogFormat::HeaderedPosition)
        .iter()
        .map(|r| r.timestep)
        .collect();
    assert_eq!(steps, vec![5, 2]);
}

#[test]
fn energy_lines_need_four_fields() {
    let text = "# Timestep 0\n1 0 0 2.5\n2 0 0\n3 0 0 nan\n";
    let recs = records(text, LogFormat::HeaderedEnergy);
    assert_eq!(recs[0].entries.len(), 2);
    assert_eq!(recs[0].entries[0].energy, Some(2.5));
    assert!(recs[0].entries[1].energy.unwrap().is_nan());
}

#[test]
fn bare_pairs_frame_by_entity_count() {
    let recs = records("1.0\n0 0\n1 0", LogFormat::BarePair { entities: 2 });
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].timestep, 0);
    assert_eq!(recs[0].positions(), vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)]);
    assert!(recs[0].entries.iter().all(|e| e.id.is_none()));
}

#[test]
fn bare_pairs_flush_partial_last_frame() {
    let recs = records("0 0\n1 1\n2 2\n", LogFormat::BarePair { entities: 2 });
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].timestep, 1);
    assert_eq!(recs[1].entries.len(), 1);
}

#[test]
fn bare_pairs_need_positive_entity_count() {
    assert!(matches!(
        parse(Cursor::new(""), LogFormat::BarePair { entities: 0 }),
        Err(VizError::InvalidConfig(_))
    ));
}

#[test]
fn two_column_scalars_skip_comments_and_noise() {
    let text = "# Step\tEntropy\n0\t0.5\n10\t0.75\n20 x\n30 1.0 2.0\n40\t0.9\n";
    let recs = records(text, LogFormat::TwoColumnScalar);
    let points: Vec<(u64, Option<f64>)> = recs.iter().map(|r| (r.timestep, r.value)).collect();
    assert_eq!(points, vec![(0, Some(0.5)), (10, Some(0.75)), (40, Some(0.9))]);
    assert!(recs.iter().all(|r| r.entries.is_empty()));
}

#[test]
fn minus_one_step_marks_the_initial_value() {
    let text = "-1 -10.0\n0 -9.5\n10 -9.0\n-2 4.0\n";
    let recs = records(text, LogFormat::TwoColumnScalar);
    assert_eq!(recs.len(), 3);
    assert!(recs[0].baseline);
    assert_eq!(recs[0].value, Some(-10.0));
    assert!(recs[1..].iter().all(|r| !r.baseline));
    assert_eq!(recs[1].timestep, 0);
}

#[test]
fn headered_scalar_keeps_first_value() {
    let text = "# Timestep 0\n-1.25\n\n# Timestep 1\n-1.5\n7.0\n# Timestep 2\n\n";
    let recs = records(text, LogFormat::HeaderedScalar);
    let values: Vec<_> = recs.iter().map(|r| (r.timestep, r.value)).collect();
    assert_eq!(values, vec![(0, Some(-1.25)), (1, Some(-1.5))]);
}

#[test]
fn trajectory_csv_groups_by_step() {
    let text = "step,id,x0,x1\n0,0,1.5,2\n0,1,3,4\n5,0,1.6,2.1\n5,1,3.1,4.1\n";
    let recs = records(text, LogFormat::TrajectoryCsv);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].timestep, 5);
    assert_eq!(recs[1].entries[1].id, Some(1));
    assert_eq!(recs[1].entries[1].position, DVec2::new(3.1, 4.1));
}

#[test]
fn empty_stream_yields_nothing() {
    assert!(records("", LogFormat::HeaderedEnergy).is_empty());
    assert!(records("\n# just a comment\n", LogFormat::HeaderedPosition).is_empty());
}
