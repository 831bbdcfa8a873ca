use std::net::UdpSocket;
use std::thread;
use std::time::{Duration, Instant};

use atclink::config::TelemetryConfig;
use atclink::telemetry::{TelemetryFrame, TelemetrySource, UdpTelemetrySource};

fn open_source(freshness: Duration) -> (UdpTelemetrySource, UdpSocket) {
    let mut config = TelemetryConfig::default();
    config.bind_address = "127.0.0.1".to_string();
    config.port = 0;
    config.freshness = freshness;

    let source = UdpTelemetrySource::new(&config).expect("bind on an ephemeral port");
    let sender = UdpSocket::bind("127.0.0.1:0").expect("bind sender socket");
    sender
        .connect(source.local_addr())
        .expect("connect to listener");
    (source, sender)
}

fn wait_for_frame(source: &mut UdpTelemetrySource, timeout: Duration) -> Option<TelemetryFrame> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(frame) = source.latest_frame() {
            return Some(frame);
        }
        thread::sleep(Duration::from_millis(10));
    }
    None
}

#[test]
fn test_receives_position_and_attitude() {
    let (mut source, sender) = open_source(Duration::from_secs(3));

    sender
        .send(b"XGPSAerofly FS4,8.54806,47.45806,1000.00,90.00,77.20")
        .unwrap();
    sender.send(b"XATTAerofly FS4,88.00,2.00,15.00").unwrap();

    // Sentences arrive as two datagrams; keep polling until both are in.
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut complete = None;
    while Instant::now() < deadline {
        if let Some(frame) = source.latest_frame()
            && frame.attitude.is_some()
        {
            complete = Some(frame);
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let frame = complete.expect("both sentences received");
    let position = frame.position.expect("position present");
    assert_eq!(position.latitude, 47.45806);
    assert_eq!(position.longitude, 8.54806);
    assert_eq!(position.altitude_m, 1000.0);
    assert_eq!(position.track_deg, 90.0);
    assert_eq!(position.ground_speed_mps, 77.2);

    let attitude = frame.attitude.expect("attitude present");
    assert_eq!(attitude.true_heading_deg, 88.0);
    assert_eq!(attitude.pitch_deg, 2.0);
    assert_eq!(attitude.roll_deg, 15.0);
}

#[test]
fn test_garbage_datagrams_are_skipped() {
    let (mut source, sender) = open_source(Duration::from_secs(3));

    sender.send(b"hello world").unwrap();
    sender.send(b"XGPS").unwrap();
    sender.send(b"XGPSAerofly FS4,not,numbers,at,all,here").unwrap();
    sender
        .send(b"XGPSAerofly FS4,8.50000,47.40000,500.00,180.00,60.00")
        .unwrap();

    let frame = wait_for_frame(&mut source, Duration::from_secs(2)).expect("valid sentence parsed");
    let position = frame.position.expect("position present");
    assert_eq!(position.altitude_m, 500.0);
    assert_eq!(position.track_deg, 180.0);
}

#[test]
fn test_position_goes_stale() {
    let (mut source, sender) = open_source(Duration::from_millis(150));

    sender
        .send(b"XGPSAerofly FS4,8.54806,47.45806,1000.00,90.00,77.20")
        .unwrap();
    assert!(
        wait_for_frame(&mut source, Duration::from_secs(2)).is_some(),
        "fresh position should be reported"
    );

    thread::sleep(Duration::from_millis(500));
    assert!(
        source.latest_frame().is_none(),
        "position older than the freshness window must not be reported"
    );
}

#[test]
fn test_attitude_alone_is_not_a_fix() {
    let (mut source, sender) = open_source(Duration::from_secs(3));

    sender.send(b"XATTAerofly FS4,45.00,1.00,2.00").unwrap();

    // Attitude has no position to anchor it, so there is no frame yet.
    let settle = Instant::now() + Duration::from_millis(300);
    while Instant::now() < settle {
        assert!(source.latest_frame().is_none());
        thread::sleep(Duration::from_millis(20));
    }

    sender
        .send(b"XGPSAerofly FS4,8.54806,47.45806,1000.00,90.00,77.20")
        .unwrap();

    let frame = wait_for_frame(&mut source, Duration::from_secs(2)).expect("position arrived");
    assert!(frame.position.is_some());
    let attitude = frame.attitude.expect("cached attitude attached to the fix");
    assert_eq!(attitude.true_heading_deg, 45.0);
}
