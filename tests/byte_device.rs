//! End-to-end behaviour of the 4mb device through its public API.

use std::sync::{Arc, Mutex};
use std::thread;

use cluu_bytedev::devices::arena::DeviceBuffer;
use cluu_bytedev::io::ioctl::{io, iow, FOURMB_HELLO};
use cluu_bytedev::io::device::{SEEK_END, SEEK_SET};
use cluu_bytedev::utils::logger;
use cluu_bytedev::{
    ByteDevice, DeviceConfig, DeviceError, Errno, FourMbModule, GlobalArena, HeapArena, Host,
    StorageArena, Whence,
};

static LOG_LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn capture(line: &str) {
    LOG_LINES.lock().unwrap().push(line.to_string());
}

fn attached(capacity: usize) -> ByteDevice {
    let dev = ByteDevice::new(
        DeviceConfig::default().with_capacity(capacity),
        Arc::new(GlobalArena),
    )
    .unwrap();
    dev.attach().unwrap();
    dev
}

#[test]
fn hello_world_truncation_scenario() {
    let dev = attached(10);
    let mut s = dev.open();

    assert_eq!(dev.write(&mut s, b"HELLOWORLD"), Ok(10));
    assert_eq!(dev.logical_size(), 10);
    assert_eq!(dev.seek(&mut s, 5, Whence::FromStart), 5);
    assert_eq!(dev.write(&mut s, b"X"), Ok(1));
    assert_eq!(dev.logical_size(), 6);

    let mut buf = [0u8; 100];
    assert_eq!(dev.read(&mut s, &mut buf), Ok(0));
}

/// Writes at increasing offsets: the size ends where the last write ended,
/// even when an earlier write reached further.
#[test]
fn logical_size_tracks_last_write_end() {
    let dev = attached(1000);
    let mut s = dev.open();

    dev.write(&mut s, &[0xAB; 900]).unwrap();
    let plan = [(100i64, 200usize), (250, 10), (260, 5)];
    for (offset, len) in plan {
        assert_eq!(dev.seek(&mut s, offset, Whence::FromStart), offset as usize);
        dev.write(&mut s, &vec![1u8; len]).unwrap();
        assert_eq!(dev.logical_size(), offset as usize + len);
    }
    assert_eq!(dev.logical_size(), 265);
}

#[test]
fn write_across_capacity_reports_truncated_count() {
    let capacity = 4096;
    let dev = attached(capacity);
    let mut s = dev.open();
    for c in [0usize, 1000, 4000, 4095] {
        dev.write(&mut s, &vec![0u8; c]).unwrap();
        dev.seek(&mut s, c as i64, Whence::FromStart);
        assert_eq!(s.cursor(), c);
        let n = dev.write(&mut s, &vec![7u8; 200]).unwrap();
        assert_eq!(n, (capacity - c).min(200));
        dev.seek(&mut s, 0, Whence::FromStart);
    }
}

#[test]
fn read_at_or_past_end_returns_nothing() {
    let dev = attached(64);
    let mut s = dev.open();
    dev.write(&mut s, b"data").unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(dev.read(&mut s, &mut buf), Ok(0));
    dev.seek(&mut s, 0, Whence::FromEnd);
    assert_eq!(dev.read(&mut s, &mut buf), Ok(0));
}

#[test]
fn full_capacity_roundtrip() {
    let dev = attached(cluu_bytedev::config::MAX_BYTES);
    let mut s = dev.open();
    let data: Vec<u8> = (0..dev.capacity()).map(|i| (i * 31 % 256) as u8).collect();

    assert_eq!(dev.write(&mut s, &data), Ok(data.len()));
    assert_eq!(dev.write(&mut s, b"more"), Ok(0));
    dev.seek(&mut s, 0, Whence::FromStart);

    let mut out = vec![0u8; data.len() + 16];
    assert_eq!(dev.read(&mut s, &mut out), Ok(data.len()));
    assert_eq!(&out[..data.len()], &data[..]);
}

#[test]
fn unknown_family_fails_before_argument_check() {
    let dev = attached(16);
    let mut s = dev.open();
    // a write-direction command with a NULL argument in a foreign family
    assert_eq!(
        dev.control(&mut s, iow(b'T', 1, 4), 0),
        Err(DeviceError::UnsupportedCommand)
    );
    // same argument inside the family fails the access check instead
    assert_eq!(
        dev.control(&mut s, iow(b'k', 1, 4), 0),
        Err(DeviceError::InvalidArgument)
    );
}

#[test]
fn hello_is_logged() {
    logger::init(log::LevelFilter::Info, capture).unwrap();

    let dev = attached(16);
    let mut s = dev.open();
    assert_eq!(dev.control(&mut s, FOURMB_HELLO, 0), Ok(0));
    assert_eq!(dev.control(&mut s, io(b'k', 3), 0), Err(DeviceError::UnsupportedCommand));

    let lines = LOG_LINES.lock().unwrap();
    assert!(lines.iter().any(|l| l.starts_with("[INFO]") && l.contains("hello")));
}

/// Concurrent writers and readers on separate sessions never observe a
/// size beyond capacity or a torn write.
#[test]
fn concurrent_sessions_are_serialized() {
    let dev = Arc::new(attached(4096));
    let mut handles = Vec::new();

    for t in 0..4u8 {
        let dev = dev.clone();
        handles.push(thread::spawn(move || {
            let mut s = dev.open();
            let block = [t; 512];
            for _ in 0..200 {
                dev.seek(&mut s, 0, Whence::FromStart);
                assert_eq!(dev.write(&mut s, &block).unwrap(), 512);

                dev.seek(&mut s, 0, Whence::FromStart);
                let mut buf = [0u8; 512];
                let n = dev.read(&mut s, &mut buf).unwrap();
                // every read block was written by a single writer
                assert!(buf[..n].windows(2).all(|w| w[0] == w[1]));
                assert!(dev.logical_size() <= dev.capacity());
            }
            dev.close(s);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(dev.logical_size(), 512);
}

#[test]
fn module_through_syscalls() {
    let host = Host::new();
    let mut module =
        FourMbModule::init(&host, DeviceConfig::default(), Arc::new(GlobalArena)).unwrap();

    let fd = host.sys_open(module.major()) as i32;
    assert!(fd >= 3);
    let msg = b"four megabytes";
    assert_eq!(unsafe { host.sys_write(fd, msg.as_ptr(), msg.len()) }, msg.len() as isize);
    assert_eq!(host.sys_lseek(fd, 5, SEEK_END), 9);

    let mut buf = [0u8; 32];
    assert_eq!(host.sys_lseek(fd, 0, SEEK_SET), 0);
    assert_eq!(unsafe { host.sys_read(fd, buf.as_mut_ptr(), buf.len()) }, msg.len() as isize);
    assert_eq!(&buf[..msg.len()], msg);
    assert_eq!(host.sys_ioctl(fd, FOURMB_HELLO, 0), 0);

    module.exit(&host);
    assert_eq!(unsafe { host.sys_read(fd, buf.as_mut_ptr(), 1) }, Errno::ENODEV.as_ret());
    assert_eq!(host.sys_close(fd), 0);
}

#[test]
fn failed_load_leaves_no_trace() {
    let region: &'static mut [u8] = Box::leak(vec![0u8; 1 << 20].into_boxed_slice());
    let heap = Arc::new(HeapArena::from_static(region));
    let host = Host::new();

    // the default 4,000,000 bytes do not fit a 1 MiB arena
    let result = FourMbModule::init(&host, DeviceConfig::default(), heap.clone());
    assert!(matches!(result, Err(Errno::ENOMEM)));
    assert!(!host.is_registered(61));
    assert_eq!(heap.used(), 0);

    let small = DeviceConfig::default().with_capacity(512 * 1024);
    let mut module = FourMbModule::init(&host, small, heap.clone()).unwrap();
    assert!(heap.used() >= 512 * 1024);
    module.exit(&host);
    assert_eq!(heap.used(), 0);
}

#[test]
fn arena_trait_object_allocates() {
    let arena: Arc<dyn StorageArena> = Arc::new(GlobalArena);
    let buf: DeviceBuffer = arena.allocate(128).unwrap();
    assert_eq!(buf.len(), 128);
}
