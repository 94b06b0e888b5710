use crate::mobility::Vector;
use crate::traffic::{Lane, RoadNet, position_at_offset};

fn lane(id: &str, shape: &[[f64; 2]], outgoing: &[&str]) -> Lane {
    let length = shape
        .windows(2)
        .map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]))
        .sum();
    Lane {
        id: id.to_string(),
        length,
        shape: shape.to_vec(),
        outgoing: outgoing.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn position_at_offset_walks_the_polyline() {
    let shape = [[0.0, 0.0], [10.0, 0.0], [10.0, 20.0]];
    assert_eq!(position_at_offset(&shape, 0.0), Some(Vector::xy(0.0, 0.0)));
    assert_eq!(position_at_offset(&shape, 4.0), Some(Vector::xy(4.0, 0.0)));
    assert_eq!(position_at_offset(&shape, 15.0), Some(Vector::xy(10.0, 5.0)));
    // 超出两端取端点
    assert_eq!(position_at_offset(&shape, -3.0), Some(Vector::xy(0.0, 0.0)));
    assert_eq!(position_at_offset(&shape, 99.0), Some(Vector::xy(10.0, 20.0)));
    assert_eq!(position_at_offset(&[], 1.0), None);
}

#[test]
fn points_of_interest_are_lane_end_then_outgoing_starts() {
    let net = RoadNet::from_lanes([
        lane("1i_3", &[[0.0, 0.0], [50.0, 0.0]], &["2o_0", "3o_0", "missing"]),
        lane("2o_0", &[[52.0, 2.0], [52.0, 80.0]], &[]),
        lane("3o_0", &[[52.0, -2.0], [52.0, -80.0]], &[]),
    ]);
    assert_eq!(net.len(), 3);

    let points = net.points_of_interest("1i_3");
    assert_eq!(
        points,
        vec![
            Vector::xy(50.0, 0.0),
            Vector::xy(52.0, 2.0),
            Vector::xy(52.0, -2.0),
        ]
    );
    assert!(net.points_of_interest("nowhere").is_empty());
}
