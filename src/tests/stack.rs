use crate::stack::{SharedStack, MIN_STACK_SIZE};

fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[test]
fn rounds_up_to_page_size() {
    let stack = SharedStack::new(1).unwrap();
    assert_eq!(stack.size() % page_size(), 0);
    assert!(stack.size() >= MIN_STACK_SIZE);
}

#[test]
fn top_is_writable() {
    let stack = SharedStack::new(64 * 1024).unwrap();
    unsafe {
        let top = stack.base().sub(1);
        top.write(0xa5);
        assert_eq!(top.read(), 0xa5);
        assert_eq!(stack.limit().add(stack.size()), stack.base());
    }
}
