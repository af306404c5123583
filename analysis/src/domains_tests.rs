use super::domains::*;

use itertools::iproduct;

#[test]
fn bool_domain_tests() {
    assert_eq!(bool::bottom(&()), false);
    assert_eq!(bool::top(&()), true);
    assert_eq!(false.join(&true, &()), true);
    assert_eq!(true.meet(&false, &()), false);
}

#[test]
fn bit_set_domain_tests() {
    let ctx = BitSetTop(5);
    let bottom = BitSetDomain::bottom(&ctx);
    let top = BitSetDomain::top(&ctx);
    let small = BitSetDomain::from(&ctx, &[1, 3]);
    let big = BitSetDomain::from(&ctx, &[0, 1, 3]);

    assert!(bottom <= small);
    assert!(small <= big);
    assert!(big <= top);
    assert!(small.partial_cmp(&BitSetDomain::from(&ctx, &[0, 2])).is_none());

    assert_eq!(small.join(&big, &ctx), big);
    assert_eq!(small.meet(&big, &ctx), small);
    assert_eq!(small.join(&bottom, &ctx), small);
    assert_eq!(small.meet(&top, &ctx), small);

    // Pretty printing
    assert_eq!(format!("{small:?}"), "{1, 3}");
}

#[test]
fn flipped_domain_tests() {
    let ctx = BitSetTop(4);
    type Dual = Flipped<BitSetDomain>;

    let bottom = Dual::bottom(&ctx);
    assert_eq!(bottom.0, BitSetDomain::top(&ctx));
    assert_eq!(Dual::top(&ctx).0, BitSetDomain::bottom(&ctx));

    let small = Flipped(BitSetDomain::from(&ctx, &[1]));
    let big = Flipped(BitSetDomain::from(&ctx, &[1, 2]));
    // The ordering is reversed: the larger set is the lower element, and
    // the full universe is the least one.
    assert!(big <= small);
    assert!(bottom <= big);
    assert!(bottom <= small);
    // Join intersects.
    assert_eq!(small.join(&big, &ctx), small);
    assert_eq!(small.join(&bottom, &ctx), small);
    assert_eq!(
        Flipped(BitSetDomain::from(&ctx, &[1, 2])).join(&Flipped(BitSetDomain::from(&ctx, &[2, 3])), &ctx),
        Flipped(BitSetDomain::from(&ctx, &[2]))
    );
}

#[test]
fn flat_domain_tests() {
    type Constant = Flat<i64>;
    let bottom = Constant::bottom(&());
    let top = Constant::top(&());
    let five = Flat::Element(5);
    let six = Flat::Element(6);

    // Ordering
    assert!(bottom <= five);
    assert!(five <= top);
    assert!(five.partial_cmp(&six).is_none());
    assert_eq!(five.partial_cmp(&five), Some(core::cmp::Ordering::Equal));

    // Joins cover the whole merge table.
    assert_eq!(bottom.join(&five, &()), five);
    assert_eq!(five.join(&bottom, &()), five);
    assert_eq!(five.join(&five, &()), five);
    assert_eq!(five.join(&six, &()), top);
    assert_eq!(top.join(&five, &()), top);
    assert_eq!(five.join(&top, &()), top);

    // Meet is the dual.
    assert_eq!(top.meet(&five, &()), five);
    assert_eq!(five.meet(&six, &()), bottom);

    // The join never loses precision: the result is an upper bound of
    // both operands over the whole (small) universe.
    let elems = [bottom, five, six, top];
    for (lhs, rhs) in iproduct!(elems.iter(), elems.iter()) {
        let joined = lhs.join(rhs, &());
        assert!(*lhs <= joined);
        assert!(*rhs <= joined);
        // Idempotent and commutative.
        assert_eq!(joined.join(lhs, &()), joined);
        assert_eq!(lhs.join(rhs, &()), rhs.join(lhs, &()));
    }
}

#[test]
fn map_domain_tests() {
    type Env = Map<&'static str, Flat<i64>>;
    let ctx = MapCtx::new(());

    let bottom = Env::bottom(&ctx);
    let mut x_five = Env::bottom(&ctx);
    x_five.insert("x", Flat::Element(5), &ctx);
    let mut x_six = Env::bottom(&ctx);
    x_six.insert("x", Flat::Element(6), &ctx);
    let mut x_five_y_one = x_five.clone();
    x_five_y_one.insert("y", Flat::Element(1), &ctx);

    // Missing keys read as bottom.
    assert_eq!(x_five.get_or_bottom(&"y", &ctx), Flat::Bottom);
    assert_eq!(x_five.get_or_bottom(&"x", &ctx), Flat::Element(5));

    // Ordering
    assert!(bottom <= x_five);
    assert!(x_five <= x_five_y_one);
    assert!(x_five.partial_cmp(&x_six).is_none());

    // Pointwise join over the union of the key sets.
    let joined = x_five.join(&x_six, &ctx);
    assert_eq!(joined.get_or_bottom(&"x", &ctx), Flat::Top);
    let joined = x_five.join(&x_five_y_one, &ctx);
    assert_eq!(joined, x_five_y_one);
    assert_eq!(bottom.join(&x_five, &ctx), x_five);

    // Commutative, idempotent.
    assert_eq!(x_five.join(&x_six, &ctx), x_six.join(&x_five, &ctx));
    assert_eq!(x_five.join(&x_five, &ctx), x_five);

    // Inserting bottom keeps the representation canonical.
    let mut canonical = x_five.clone();
    canonical.insert("z", Flat::Bottom, &ctx);
    assert_eq!(canonical, x_five);

    // Pretty printing is sorted by key.
    assert_eq!(
        format!("{x_five_y_one:?}"),
        r#"{"x": Element(5), "y": Element(1)}"#
    );
}
