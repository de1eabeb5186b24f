//! Pipe and Map behaviour tests

use fw_mem::{Fifo, KeyValue, Map, MapError, Pipe, Shared, SharedPipe};

#[test]
fn test_round_trip_in_order() {
    let mut pipe: Fifo<16> = Pipe::new();
    let mut expected = Vec::new();
    let mut received = Vec::new();
    let mut next = 0u8;
    for chunk in [3usize, 5, 1, 6, 0, 4, 7] {
        let data: Vec<u8> = (0..chunk).map(|_| {
            next = next.wrapping_add(1);
            next
        }).collect();
        assert_eq!(pipe.write(&data), chunk);
        expected.extend_from_slice(&data);

        let mut out = [0u8; 4];
        let n = pipe.read(&mut out);
        received.extend_from_slice(&out[..n]);
    }
    let mut out = [0u8; 16];
    let n = pipe.read(&mut out);
    received.extend_from_slice(&out[..n]);
    assert_eq!(received, expected);
    assert!(pipe.is_empty());
}

#[test]
fn test_overflow_leaves_pipe_unchanged() {
    let mut pipe: Fifo<8> = Pipe::new();
    assert_eq!(pipe.write(&[1, 2, 3, 4, 5]), 5);
    let before = (pipe.read_index(), pipe.write_index());

    assert_eq!(pipe.write(&[6, 7, 8]), 0);
    assert!(pipe.is_truncated());
    assert_eq!((pipe.read_index(), pipe.write_index()), before);
    assert_eq!(pipe.used_count(), 5);

    // Still truncated after a read; only a successful write clears it.
    assert_eq!(pipe.read_one(), Some(1));
    assert!(pipe.is_truncated());
    assert_eq!(pipe.write(&[6, 7]), 2);
    assert!(!pipe.is_truncated());
}

#[test]
fn test_status_reports_empty_edges() {
    let mut pipe: Fifo<8> = Pipe::new();
    assert_eq!(pipe.write_status(&[1, 2]), (2, true));
    assert_eq!(pipe.write_status(&[3]), (1, false));

    let mut out = [0u8; 2];
    assert_eq!(pipe.read_status(&mut out), (2, false));
    assert_eq!(pipe.read_status(&mut out), (1, true));
    assert_eq!(pipe.read_status(&mut out), (0, false));
}

#[test]
fn test_zero_copy_block_transfer() {
    let mut pipe: Fifo<8> = Pipe::new();
    let block = pipe.write_block();
    assert_eq!(block.len(), 7);
    block[..3].copy_from_slice(b"abc");
    pipe.inc_write_index(3);

    assert_eq!(pipe.read_block(), b"abc");
    pipe.inc_read_index(2);
    assert_eq!(pipe.peek(), Some(b'c'));
}

#[test]
fn test_producer_thread_through_shared_pipe() {
    use std::sync::Arc;

    let fifo: Arc<SharedPipe<u8, 64>> = Arc::new(Shared::new(Pipe::new()));
    let producer = {
        let fifo = fifo.clone();
        std::thread::spawn(move || {
            let mut sent = 0u32;
            while sent < 200 {
                let byte = (sent % 251) as u8;
                if fifo.lock(|p| p.write_one(byte)) {
                    sent += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        })
    };

    let mut got = Vec::new();
    while got.len() < 200 {
        let mut buf = [0u8; 16];
        let n = fifo.lock(|p| p.read(&mut buf));
        got.extend_from_slice(&buf[..n]);
        if n == 0 {
            std::thread::yield_now();
        }
    }
    producer.join().unwrap();
    let expected: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(got, expected);
}

#[test]
fn test_map_full_is_observable() {
    let mut map: Map<u8, &'static str, 3> = Map::new(0, "");
    for (k, v) in [(1, "uart"), (2, "gpio"), (3, "i2c")] {
        map.save(k, v).unwrap();
    }
    assert!(map.is_full());
    assert_eq!(map.save(4, "spi"), Err(MapError::Full));
    let live: Vec<KeyValue<u8, &str>> = map.iter().copied().collect();
    assert_eq!(live.len(), 3);
    assert_eq!(map.get_first_by_value(&"gpio"), Some(2));

    assert!(map.clear_by_key(&2));
    assert_eq!(map.save(4, "spi"), Ok(1));
    assert_eq!(map.get_by_index(1), Some(&KeyValue::new(4, "spi")));
}
