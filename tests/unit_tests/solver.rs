use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CooMatrix;
use sleipnir::assembly::dim1::assemble_mass_1d;
use sleipnir::block::{coo_from_blocks, BlockOperator, BlockVector};
use sleipnir::operator::StencilOperator;
use sleipnir::solve::{hcurl_mass_solver, KroneckerSolver};
use sleipnir::space::SplineSpace;
use sleipnir::stencil::{StencilMatrix, StencilVector, StencilVectorSpace};
use sleipnir::{BlockAxis, Error};
use std::sync::Arc;

fn mass_matrix(degree: usize, nelements: usize) -> (SplineSpace<f64>, StencilMatrix<f64>) {
    let space = SplineSpace::<f64>::with_uniform_grid(degree, nelements);
    let mut mass = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_mass_1d(&space, &mut mass).unwrap();
    (space, mass)
}

fn product_space(
    n1: usize,
    n2: usize,
    pads: (usize, usize),
) -> Arc<StencilVectorSpace<f64>> {
    StencilVectorSpace::new(vec![n1, n2], vec![pads.0, pads.1], vec![false, false]).unwrap()
}

#[test]
fn kronecker_solver_matches_dense_tensor_product_solve() {
    let (s1, m1) = mass_matrix(2, 4);
    let (s2, m2) = mass_matrix(2, 5);
    let (n1, n2) = (s1.nbasis(), s2.nbasis());

    let space = product_space(n1, n2, (2, 2));
    let solver = KroneckerSolver::new(&m1, &m2, &space).unwrap();

    // Deterministic but unstructured right-hand side
    let b_flat = DVector::from_fn(n1 * n2, |k, _| ((k * k + 3) as f64 * 0.59).sin());
    let mut b = StencilVector::zeros(&space);
    b.copy_owned_from(&b_flat).unwrap();

    let x = solver.apply(&b).unwrap().to_dvector();

    let dense = m1.to_dense().unwrap().kronecker(&m2.to_dense().unwrap());
    let x_dense = dense.lu().solve(&b_flat).unwrap();

    assert_matrix_eq!(x, x_dense, comp = abs, tol = 1e-10);
}

#[test]
fn kronecker_solver_inverts_the_tensor_product_operator() {
    let (s1, m1) = mass_matrix(3, 3);
    let (s2, m2) = mass_matrix(2, 4);
    let space = product_space(s1.nbasis(), s2.nbasis(), (3, 2));
    let solver = KroneckerSolver::new(&m1, &m2, &space).unwrap();

    let n = space.dimension();
    let b_flat = DVector::from_fn(n, |k, _| 1.0 / (k as f64 + 1.0));
    let mut b = StencilVector::zeros(&space);
    b.copy_owned_from(&b_flat).unwrap();

    let x = solver.apply(&b).unwrap().to_dvector();
    let dense = m1.to_dense().unwrap().kronecker(&m2.to_dense().unwrap());
    assert_matrix_eq!(&dense * x, b_flat, comp = abs, tol = 1e-10);
}

#[test]
fn kronecker_solver_checks_space_dimensions() {
    let (_, m1) = mass_matrix(2, 4);
    let (_, m2) = mass_matrix(2, 5);

    // Dimensions swapped
    let space = product_space(7, 6, (2, 2));
    assert!(KroneckerSolver::new(&m1, &m2, &space).is_err());
}

#[test]
fn hcurl_mass_solver_inverts_both_components() {
    // Full-degree and reduced-degree mass matrices along each axis
    let (b1, mass_1) = mass_matrix(2, 4);
    let (d1, mass_1_reduced) = mass_matrix(1, 4);
    let (b2, mass_2) = mass_matrix(2, 3);
    let (d2, mass_2_reduced) = mass_matrix(1, 3);

    let space_0 = product_space(d1.nbasis(), b2.nbasis(), (1, 2));
    let space_1 = product_space(b1.nbasis(), d2.nbasis(), (2, 1));

    let solver = hcurl_mass_solver(
        &mass_1,
        &mass_1_reduced,
        &mass_2,
        &mass_2_reduced,
        &space_0,
        &space_1,
    )
    .unwrap();
    assert_eq!(solver.nrows(), 2);
    assert!(solver.block(0, 1).is_none());

    let b0_flat = DVector::from_fn(space_0.dimension(), |k, _| (k as f64 * 0.71).cos());
    let b1_flat = DVector::from_fn(space_1.dimension(), |k, _| (k as f64 * 0.31).sin());
    let mut rhs_0 = StencilVector::zeros(&space_0);
    let mut rhs_1 = StencilVector::zeros(&space_1);
    rhs_0.copy_owned_from(&b0_flat).unwrap();
    rhs_1.copy_owned_from(&b1_flat).unwrap();

    let x = solver.apply(&BlockVector::new(vec![rhs_0, rhs_1])).unwrap();

    // Each component solves against its de Rham-matched Kronecker mass
    let dense_0 = mass_1_reduced
        .to_dense()
        .unwrap()
        .kronecker(&mass_2.to_dense().unwrap());
    let dense_1 = mass_1
        .to_dense()
        .unwrap()
        .kronecker(&mass_2_reduced.to_dense().unwrap());

    assert_matrix_eq!(
        &dense_0 * x.block(0).to_dvector(),
        b0_flat,
        comp = abs,
        tol = 1e-10
    );
    assert_matrix_eq!(
        &dense_1 * x.block(1).to_dvector(),
        b1_flat,
        comp = abs,
        tol = 1e-10
    );
}

#[test]
fn block_operator_rejects_empty_rows_and_columns() {
    let (_, m) = mass_matrix(2, 4);

    // Populated (0, 0) block only: row 1 and column 1 are empty
    let blocks: Vec<Option<Box<dyn StencilOperator<f64>>>> =
        vec![Some(Box::new(m)), None, None, None];
    let result = BlockOperator::new(2, 2, blocks);
    match result {
        Err(Error::EmptyBlock { axis, index }) => {
            assert_eq!(axis, BlockAxis::Row);
            assert_eq!(index, 1);
        }
        _ => panic!("expected an empty-block error"),
    }
}

#[test]
fn block_diagonal_operator_applies_blockwise() {
    let (s1, m1) = mass_matrix(1, 3);
    let (s2, m2) = mass_matrix(2, 3);

    let diagonal: Vec<Box<dyn StencilOperator<f64>>> =
        vec![Box::new(m1.clone()), Box::new(m2.clone())];
    let block_op = BlockOperator::block_diagonal(diagonal).unwrap();

    let mut v0 = StencilVector::zeros(s1.vector_space());
    let mut v1 = StencilVector::zeros(s2.vector_space());
    for i in 0..s1.nbasis() as isize {
        v0.set(&[i], i as f64 + 1.0);
    }
    for i in 0..s2.nbasis() as isize {
        v1.set(&[i], -(i as f64) - 1.0);
    }

    let out = block_op
        .apply(&BlockVector::new(vec![v0.clone(), v1.clone()]))
        .unwrap();
    assert_matrix_eq!(
        out.block(0).to_dvector(),
        m1.apply(&v0).unwrap().to_dvector()
    );
    assert_matrix_eq!(
        out.block(1).to_dvector(),
        m2.apply(&v1).unwrap().to_dvector()
    );
}

#[test]
fn coo_from_blocks_shifts_block_extents() {
    let mut a = CooMatrix::new(2, 2);
    a.push(0, 0, 1.0);
    a.push(1, 1, 2.0);
    let mut b = CooMatrix::new(3, 3);
    b.push(0, 2, 3.0);
    b.push(2, 0, 4.0);

    let blocks = vec![vec![Some(a), None], vec![None, Some(b)]];
    let coo = coo_from_blocks(&blocks, 2, 2).unwrap();
    assert_eq!(coo.nrows(), 5);
    assert_eq!(coo.ncols(), 5);

    let mut dense = DMatrix::<f64>::zeros(5, 5);
    for (i, j, &v) in coo.triplet_iter() {
        dense[(i, j)] += v;
    }
    assert_eq!(dense[(0, 0)], 1.0);
    assert_eq!(dense[(1, 1)], 2.0);
    assert_eq!(dense[(2, 4)], 3.0);
    assert_eq!(dense[(4, 2)], 4.0);
}

#[test]
fn coo_from_blocks_requires_populated_rows_and_columns() {
    let mut a = CooMatrix::<f64>::new(2, 2);
    a.push(0, 0, 1.0);

    // Column 1 has no populated block
    let blocks = vec![vec![Some(a.clone()), None], vec![Some(a), None]];
    let result = coo_from_blocks(&blocks, 2, 2);
    match result {
        Err(Error::EmptyBlock { axis, index }) => {
            assert_eq!(axis, BlockAxis::Column);
            assert_eq!(index, 1);
        }
        _ => panic!("expected an empty-block error"),
    }
}
