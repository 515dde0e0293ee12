use super::*;

#[yare::parameterized(
    start = { "start", Command::Start },
    restart = { "restart", Command::Restart },
    register = { "register", Command::Register },
    barrier = { "barrier", Command::Barrier },
    exclude = { "exclude", Command::Exclude },
    unexclude = { "unexclude", Command::Unexclude },
    heartbeat = { "heartbeat", Command::Heartbeat },
    print = { "print", Command::Print },
    checkpoint = { "checkpoint", Command::Checkpoint },
    load_checkpoint = { "load_checkpoint", Command::LoadCheckpoint },
    shutdown = { "shutdown", Command::Shutdown },
)]
fn parses_every_recognized_verb(verb: &str, expected: Command) {
    assert_eq!(Command::parse(verb), Some(expected));
    assert_eq!(expected.as_str(), verb);
}

#[test]
fn unknown_verb_does_not_parse() {
    assert_eq!(Command::parse("frobnicate"), None);
    assert_eq!(Command::parse(""), None);
    assert_eq!(Command::parse("START"), None);
}
