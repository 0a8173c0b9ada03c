use proptest::collection::vec;
use proptest::prelude::*;
use sleipnir::block::BlockVector;
use sleipnir::boundary::{DirichletProjector, TangentialProjector};
use sleipnir::operator::StencilOperator;
use sleipnir::stencil::{StencilVector, StencilVectorSpace};
use std::sync::Arc;

fn filled_vector(
    space: &Arc<StencilVectorSpace<f64>>,
    values: &[f64],
) -> StencilVector<f64> {
    let mut v = StencilVector::zeros(space);
    v.copy_owned_from(&nalgebra::DVector::from_vec(values.to_vec()))
        .unwrap();
    v
}

#[test]
fn scalar_projector_zeroes_only_non_periodic_sides() {
    // Periodic in x, clamped in y
    let space = StencilVectorSpace::<f64>::new(vec![5, 4], vec![2, 2], vec![true, false]).unwrap();
    let projector = DirichletProjector::try_new(&space).unwrap();
    assert_eq!(projector.constrained_dims(), &[1]);

    let values: Vec<f64> = (0..20).map(|i| i as f64 + 1.0).collect();
    let v = filled_vector(&space, &values);
    let projected = projector.apply(&v).unwrap();

    for i1 in 0..5isize {
        for i2 in 0..4isize {
            let value = projected.get(&[i1, i2]);
            if i2 == 0 || i2 == 3 {
                assert_eq!(value, 0.0, "({i1}, {i2}) should be constrained");
            } else {
                assert_eq!(value, v.get(&[i1, i2]), "({i1}, {i2}) should be untouched");
            }
        }
    }
}

#[test]
fn scalar_projector_is_absent_for_fully_periodic_spaces() {
    let space = StencilVectorSpace::<f64>::new(vec![5, 4], vec![1, 1], vec![true, true]).unwrap();
    assert!(DirichletProjector::try_new(&space).is_none());

    let clamped = StencilVectorSpace::<f64>::new(vec![5], vec![1], vec![false]).unwrap();
    assert!(DirichletProjector::try_new(&clamped).is_some());
}

#[test]
fn tangential_projector_constrains_the_orthogonal_sides() {
    // Periodic in x, clamped in y. Component 0 is tangent to the y-sides,
    // component 1 to the x-sides (which do not exist here).
    let space_0 = StencilVectorSpace::<f64>::new(vec![4, 5], vec![1, 2], vec![true, false]).unwrap();
    let space_1 = StencilVectorSpace::<f64>::new(vec![5, 4], vec![2, 1], vec![true, false]).unwrap();
    let projector = TangentialProjector::try_new(&space_0, &space_1).unwrap();

    let values_0: Vec<f64> = (0..20).map(|i| i as f64 + 1.0).collect();
    let values_1: Vec<f64> = (0..20).map(|i| -(i as f64) - 1.0).collect();
    let v = BlockVector::new(vec![
        filled_vector(&space_0, &values_0),
        filled_vector(&space_1, &values_1),
    ]);

    let projected = projector.apply(&v).unwrap();

    // Component 0: zeroed on the sides of dimension 1
    for i1 in 0..4isize {
        for i2 in 0..5isize {
            let value = projected.block(0).get(&[i1, i2]);
            if i2 == 0 || i2 == 4 {
                assert_eq!(value, 0.0);
            } else {
                assert_eq!(value, v.block(0).get(&[i1, i2]));
            }
        }
    }

    // Component 1: its constrained dimension (0) is periodic, so nothing
    // changes anywhere, including along the clamped y-sides
    for i1 in 0..5isize {
        for i2 in 0..4isize {
            assert_eq!(
                projected.block(1).get(&[i1, i2]),
                v.block(1).get(&[i1, i2])
            );
        }
    }
}

#[test]
fn tangential_projector_is_absent_for_fully_periodic_spaces() {
    let space_0 = StencilVectorSpace::<f64>::new(vec![4, 5], vec![1, 2], vec![true, true]).unwrap();
    let space_1 = StencilVectorSpace::<f64>::new(vec![5, 4], vec![2, 1], vec![true, true]).unwrap();
    assert!(TangentialProjector::try_new(&space_0, &space_1).is_none());
}

proptest! {
    #[test]
    fn scalar_projection_is_idempotent(values in vec(-10.0..10.0f64, 24)) {
        let space =
            StencilVectorSpace::<f64>::new(vec![6, 4], vec![2, 1], vec![false, false]).unwrap();
        let projector = DirichletProjector::try_new(&space).unwrap();

        let v = filled_vector(&space, &values);
        let once = projector.apply(&v).unwrap();
        let twice = projector.apply(&once).unwrap();
        prop_assert_eq!(once.to_dvector(), twice.to_dvector());
    }

    #[test]
    fn tangential_projection_is_idempotent(
        values_0 in vec(-10.0..10.0f64, 12),
        values_1 in vec(-10.0..10.0f64, 12),
    ) {
        let space_0 =
            StencilVectorSpace::<f64>::new(vec![3, 4], vec![1, 2], vec![false, false]).unwrap();
        let space_1 =
            StencilVectorSpace::<f64>::new(vec![4, 3], vec![2, 1], vec![false, false]).unwrap();
        let projector = TangentialProjector::try_new(&space_0, &space_1).unwrap();

        let v = BlockVector::new(vec![
            filled_vector(&space_0, &values_0),
            filled_vector(&space_1, &values_1),
        ]);
        let once = projector.apply(&v).unwrap();
        let twice = projector.apply(&once).unwrap();
        for c in 0..2 {
            prop_assert_eq!(
                once.block(c).to_dvector(),
                twice.block(c).to_dvector()
            );
        }
    }
}
