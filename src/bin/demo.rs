//! A small harness that exercises the public allocator API end to end:
//! create a pool, allocate and size a few blocks, release them, and print
//! the resulting free lists. Not part of the tested contract — just a
//! manual smoke test, the spiritual successor of a quick `assert`-laden
//! `main()`.

use buddy_pool::{Pool, logger};

fn main()
{
    logger::init();

    let mut pool = Pool::create(65536, 4, 12).expect("failed to create pool");
    println!("{pool}");

    let p1 = pool.allocate(10).expect("allocate(10) should succeed");
    println!("allocate(10) -> {:p} (size {})", p1, pool.sizeof(p1.as_ptr()));

    let p2 = pool.allocate(4000).expect("allocate(4000) should succeed");
    println!("allocate(4000) -> {:p} (size {})", p2, pool.sizeof(p2.as_ptr()));

    match pool.allocate(5000)
    {
        Some(p) => println!("allocate(5000) unexpectedly succeeded: {p:p}"),
        None => println!("allocate(5000) -> None (exceeds max order), as expected"),
    }

    pool.release(p1.as_ptr());
    let p3 = pool.allocate(16).expect("allocate(16) should reuse p1's block");
    println!("allocate(16) after releasing p1 -> {:p} (reused: {})", p3, p3 == p1);

    println!("{pool}");
}
