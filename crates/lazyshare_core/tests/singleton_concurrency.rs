use lazyshare_core::{SingletonHolder, SingletonState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const CALLERS: usize = 16;

struct SharedResource {
    serial: usize,
}

static RESOURCE: SingletonHolder<SharedResource> = SingletonHolder::new();
static RESOURCE_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

fn shared_resource() -> &'static SharedResource {
    RESOURCE.get_or_init(|| SharedResource {
        serial: RESOURCE_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst),
    })
}

#[test]
fn concurrent_callers_share_one_static_instance() {
    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared_resource() as *const SharedResource as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(RESOURCE_CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert_eq!(shared_resource().serial, 0);
    assert_eq!(RESOURCE.state(), SingletonState::Ready);
}

#[test]
fn scoped_threads_observe_single_construction() {
    let holder: SingletonHolder<Vec<u8>> = SingletonHolder::new();
    let constructions = AtomicUsize::new(0);
    let barrier = Barrier::new(CALLERS);
    let (holder, constructions, barrier) = (&holder, &constructions, &barrier);

    let addresses: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    let instance = holder.get_or_init(|| {
                        constructions.fetch_add(1, Ordering::SeqCst);
                        vec![1, 2, 3]
                    });
                    instance as *const Vec<u8> as usize
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(holder.get().unwrap(), &vec![1, 2, 3]);
}

#[test]
fn initialized_holder_never_reruns_constructor() {
    let holder = SingletonHolder::new();
    let constructions = AtomicUsize::new(0);

    for _ in 0..100 {
        holder.get_or_init(|| constructions.fetch_add(1, Ordering::SeqCst));
    }

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(holder.get(), Some(&0));
}

#[test]
fn concurrent_failures_are_retried_until_one_succeeds() {
    let holder: SingletonHolder<String> = SingletonHolder::new();
    let attempts = AtomicUsize::new(0);
    let barrier = Barrier::new(CALLERS);
    let (holder, attempts, barrier) = (&holder, &attempts, &barrier);

    let outcomes: Vec<Result<usize, String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    holder
                        .get_or_try_init(|| {
                            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                            if attempt < 3 {
                                Err(format!("attempt {attempt} failed"))
                            } else {
                                Ok(format!("ready after {attempt}"))
                            }
                        })
                        .map(|instance| instance as *const String as usize)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    let successes: Vec<usize> = outcomes.into_iter().filter_map(Result::ok).collect();

    assert_eq!(failures, 3);
    assert_eq!(successes.len(), CALLERS - 3);
    assert!(successes.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(holder.get().map(String::as_str), Some("ready after 3"));
}
