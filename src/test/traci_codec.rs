use crate::traffic::traci::codec::{
    self, CMD_GET_VEHICLE_VARIABLE, CMD_SIMSTEP, Reader, TraciError, TraciValue, VAR_ID_LIST,
    VAR_POSITION,
};

#[test]
fn simstep_message_layout() {
    let msg = codec::simstep_message(1.5);
    // u32 总长 + [len=10][0x02][f64]
    assert_eq!(msg.len(), 4 + 1 + 1 + 8);
    assert_eq!(&msg[..4], &14u32.to_be_bytes());
    assert_eq!(msg[4], 10);
    assert_eq!(msg[5], CMD_SIMSTEP);
    assert_eq!(&msg[6..], &1.5f64.to_be_bytes());
}

#[test]
fn get_variable_message_layout() {
    let msg = codec::get_variable_message(CMD_GET_VEHICLE_VARIABLE, VAR_POSITION, "car1");
    let mut expected = Vec::new();
    expected.extend_from_slice(&15u32.to_be_bytes());
    expected.extend_from_slice(&[11, CMD_GET_VEHICLE_VARIABLE, VAR_POSITION]);
    expected.extend_from_slice(&4u32.to_be_bytes());
    expected.extend_from_slice(b"car1");
    assert_eq!(msg, expected);
}

#[test]
fn long_commands_use_extended_length() {
    let id = "v".repeat(300);
    let msg = codec::get_variable_message(CMD_GET_VEHICLE_VARIABLE, VAR_POSITION, &id);
    assert_eq!(msg[4], 0);
    let ext = u32::from_be_bytes([msg[5], msg[6], msg[7], msg[8]]) as usize;
    assert_eq!(ext, msg.len() - 4);
    assert_eq!(msg[9], CMD_GET_VEHICLE_VARIABLE);

    let mut r = Reader::new(&msg[4..]);
    let (cmd, mut body) = r.command().expect("command");
    assert_eq!(cmd, CMD_GET_VEHICLE_VARIABLE);
    assert_eq!(body.u8().expect("var"), VAR_POSITION);
    assert_eq!(body.string().expect("id"), id);
    assert_eq!(r.remaining(), 0);
}

#[test]
fn parses_status_then_variable_response() {
    let mut body = Vec::new();
    codec::status_command(&mut body, CMD_GET_VEHICLE_VARIABLE, codec::RTYPE_OK, "");
    codec::variable_command(
        &mut body,
        CMD_GET_VEHICLE_VARIABLE,
        VAR_ID_LIST,
        "",
        &TraciValue::StringList(vec!["car1".into(), "car2".into()]),
    );

    let mut r = Reader::new(&body);
    r.status(CMD_GET_VEHICLE_VARIABLE).expect("status");
    let ids = r
        .variable(CMD_GET_VEHICLE_VARIABLE, VAR_ID_LIST)
        .and_then(TraciValue::into_string_list)
        .expect("id list");
    assert_eq!(ids, ["car1", "car2"]);
}

#[test]
fn error_status_carries_description() {
    let mut body = Vec::new();
    codec::status_command(&mut body, CMD_SIMSTEP, 0xff, "Vehicle 'x' is not known");
    let err = Reader::new(&body).status(CMD_SIMSTEP).unwrap_err();
    match err {
        TraciError::Status { command, description } => {
            assert_eq!(command, CMD_SIMSTEP);
            assert_eq!(description, "Vehicle 'x' is not known");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn truncated_and_mistyped_values_are_errors() {
    let mut r = Reader::new(&[codec::TYPE_DOUBLE, 0x40, 0x24]);
    assert!(matches!(r.value(), Err(TraciError::Truncated { needed: 8, remaining: 2 })));

    let err = TraciValue::Double(1.0).into_position().unwrap_err();
    assert!(matches!(
        err,
        TraciError::UnexpectedType {
            expected: codec::TYPE_POSITION_2D,
            found: codec::TYPE_DOUBLE
        }
    ));

    let mut r = Reader::new(&[0x7a]);
    assert!(matches!(r.value(), Err(TraciError::UnknownType(0x7a))));
}
