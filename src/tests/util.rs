use crate::util::{join_ptr, split_ptr};

#[test]
fn round_trip() {
    for addr in [0usize, 1, 0xdead_beef, usize::MAX] {
        let (low, high) = split_ptr(addr);
        assert_eq!(join_ptr(low, high), addr);
    }
}
