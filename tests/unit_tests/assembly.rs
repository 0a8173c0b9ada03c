use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use sleipnir::assembly::dim1::{assemble_mass_1d, assemble_rhs_1d, assemble_stiffness_1d};
use sleipnir::assembly::dim2::{
    assemble_diffusion_2d, assemble_mass_2d, assemble_rhs_2d, assemble_stiffness_2d,
};
use sleipnir::space::{SplineSpace, TensorProductSpace};
use sleipnir::stencil::{StencilMatrix, StencilVector};
use std::f64::consts::PI;

#[test]
fn linear_stiffness_matrix_has_known_entries() {
    // Degree 1 on a uniform grid: the classic tridiagonal [-1/h, 2/h, -1/h]
    let space = SplineSpace::<f64>::with_uniform_grid(1, 4);
    let mut stiffness = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_stiffness_1d(&space, &mut stiffness).unwrap();

    let h = 0.25;
    assert_scalar_eq!(stiffness.get(&[2], &[0]), 2.0 / h, comp = abs, tol = 1e-12);
    assert_scalar_eq!(stiffness.get(&[2], &[1]), -1.0 / h, comp = abs, tol = 1e-12);
    assert_scalar_eq!(stiffness.get(&[2], &[-1]), -1.0 / h, comp = abs, tol = 1e-12);
    // Boundary basis function supported on a single element
    assert_scalar_eq!(stiffness.get(&[0], &[0]), 1.0 / h, comp = abs, tol = 1e-12);
    assert_scalar_eq!(stiffness.get(&[0], &[1]), -1.0 / h, comp = abs, tol = 1e-12);
}

#[test]
fn linear_mass_matrix_has_known_entries() {
    let space = SplineSpace::<f64>::with_uniform_grid(1, 4);
    let mut mass = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_mass_1d(&space, &mut mass).unwrap();

    let h = 0.25;
    assert_scalar_eq!(mass.get(&[2], &[0]), 2.0 * h / 3.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(mass.get(&[2], &[1]), h / 6.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(mass.get(&[0], &[0]), h / 3.0, comp = abs, tol = 1e-12);
}

#[test]
fn mass_matrix_entries_sum_to_domain_measure() {
    // Partition of unity: sum_ij integral(B_i B_j) = integral(1) = 1
    let space = SplineSpace::<f64>::with_uniform_grid(3, 6);
    let mut mass = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_mass_1d(&space, &mut mass).unwrap();

    let total: f64 = mass.to_coo().triplet_iter().map(|(_, _, v)| v).sum();
    assert_scalar_eq!(total, 1.0, comp = abs, tol = 1e-13);
}

#[test]
fn periodic_mass_matrix_has_constant_row_sums() {
    // On a periodic uniform grid every basis function is a shifted copy, so
    // every row sums to integral(B) = 1 / nbasis
    let breaks: Vec<f64> = (0..=8).map(|i| i as f64 / 8.0).collect();
    let space = SplineSpace::from_breaks(2, breaks, true, 1);
    let mut mass = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_mass_1d(&space, &mut mass).unwrap();

    let dense = mass.to_dense().unwrap();
    for i in 0..space.nbasis() {
        let row_sum: f64 = dense.row(i).iter().sum();
        assert_scalar_eq!(row_sum, 1.0 / 8.0, comp = abs, tol = 1e-13);
    }
}

#[test]
fn stiffness_2d_is_symmetric() {
    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 4);
    let v2 = SplineSpace::<f64>::with_uniform_grid(3, 3);
    let space = TensorProductSpace::new(vec![v1, v2]);

    let mut stiffness = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_stiffness_2d(&space, &mut stiffness).unwrap();

    let dense = stiffness.to_dense().unwrap();
    assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn stiffness_2d_separates_into_kronecker_factors() {
    // For a tensor-product basis the Laplacian splits exactly:
    // 2-D stiffness = K1 (x) M2 + M1 (x) K2
    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 4);
    let v2 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let space = TensorProductSpace::new(vec![v1.clone(), v2.clone()]);

    let mut stiffness = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_stiffness_2d(&space, &mut stiffness).unwrap();

    let factor = |s: &SplineSpace<f64>| {
        let mut k = StencilMatrix::new(s.vector_space(), s.vector_space()).unwrap();
        assemble_stiffness_1d(s, &mut k).unwrap();
        let mut m = StencilMatrix::new(s.vector_space(), s.vector_space()).unwrap();
        assemble_mass_1d(s, &mut m).unwrap();
        (k.to_dense().unwrap(), m.to_dense().unwrap())
    };
    let (k1, m1) = factor(&v1);
    let (k2, m2) = factor(&v2);

    let expected = k1.kronecker(&m2) + m1.kronecker(&k2);
    assert_matrix_eq!(stiffness.to_dense().unwrap(), expected, comp = abs, tol = 1e-12);
}

#[test]
fn mass_2d_separates_into_kronecker_factors() {
    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let v2 = SplineSpace::<f64>::with_uniform_grid(1, 4);
    let space = TensorProductSpace::new(vec![v1.clone(), v2.clone()]);

    let mut mass = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_mass_2d(&space, &mut mass).unwrap();

    let factor = |s: &SplineSpace<f64>| {
        let mut m = StencilMatrix::new(s.vector_space(), s.vector_space()).unwrap();
        assemble_mass_1d(s, &mut m).unwrap();
        m.to_dense().unwrap()
    };
    let expected = factor(&v1).kronecker(&factor(&v2));
    assert_matrix_eq!(mass.to_dense().unwrap(), expected, comp = abs, tol = 1e-13);
}

#[test]
fn diffusion_with_unit_coefficient_reduces_to_stiffness() {
    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let v2 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let space = TensorProductSpace::new(vec![v1, v2]);

    let u = StencilVector::zeros(space.vector_space());

    let mut diffusion = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_diffusion_2d(&space, &u, |u| 1.0 + u * u, &mut diffusion).unwrap();

    let mut stiffness = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_stiffness_2d(&space, &mut stiffness).unwrap();

    assert_matrix_eq!(
        diffusion.to_dense().unwrap(),
        stiffness.to_dense().unwrap(),
        comp = abs,
        tol = 1e-13
    );
}

#[test]
fn nonlinear_diffusion_matrix_stays_symmetric() {
    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let v2 = SplineSpace::<f64>::with_uniform_grid(2, 3);
    let space = TensorProductSpace::new(vec![v1, v2]);

    // A nontrivial current iterate
    let mut u = StencilVector::zeros(space.vector_space());
    let npts = space.vector_space().npts().to_vec();
    for i1 in 0..npts[0] as isize {
        for i2 in 0..npts[1] as isize {
            u.set(&[i1, i2], ((i1 + 2 * i2) as f64 * 0.37).sin());
        }
    }

    let mut diffusion = StencilMatrix::new(space.vector_space(), space.vector_space()).unwrap();
    assemble_diffusion_2d(&space, &u, |u| 1.0 + u * u, &mut diffusion).unwrap();

    let dense = diffusion.to_dense().unwrap();
    assert_matrix_eq!(dense, dense.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn rhs_entries_sum_to_source_integral() {
    // Partition of unity again: sum_i integral(f B_i) = integral(f)
    let space = SplineSpace::<f64>::with_uniform_grid(2, 5);
    let mut rhs = StencilVector::zeros(space.vector_space());
    assemble_rhs_1d(&space, |_| 3.0, &mut rhs).unwrap();
    assert_scalar_eq!(rhs.to_dvector().sum(), 3.0, comp = abs, tol = 1e-13);

    let v1 = SplineSpace::<f64>::with_uniform_grid(2, 4);
    let v2 = SplineSpace::<f64>::with_uniform_grid(1, 4);
    let tensor = TensorProductSpace::new(vec![v1, v2]);
    let mut rhs2 = StencilVector::zeros(tensor.vector_space());
    assemble_rhs_2d(&tensor, |_, _| 2.0, &mut rhs2).unwrap();
    assert_scalar_eq!(rhs2.to_dvector().sum(), 2.0, comp = abs, tol = 1e-13);
}

#[test]
fn rhs_resolves_the_source_location() {
    // A source concentrated near x = 0 must load the first basis function
    // far more than the last one
    let space = SplineSpace::<f64>::with_uniform_grid(2, 8);
    let mut rhs = StencilVector::zeros(space.vector_space());
    assemble_rhs_1d(&space, |x| (-50.0 * x * x).exp(), &mut rhs).unwrap();

    let flat = rhs.to_dvector();
    assert!(flat[0] > 10.0 * flat[flat.len() - 1].abs());
}

#[test]
fn assembly_rejects_foreign_containers() {
    let space = SplineSpace::<f64>::with_uniform_grid(2, 4);
    let other = SplineSpace::<f64>::with_uniform_grid(2, 4);

    // Same shape, different space object
    let mut matrix = StencilMatrix::new(other.vector_space(), other.vector_space()).unwrap();
    assert!(assemble_mass_1d(&space, &mut matrix).is_err());
}

#[test]
fn manufactured_sine_rhs_is_positive_in_the_interior() {
    let v1 = SplineSpace::<f64>::with_uniform_grid(3, 4);
    let v2 = SplineSpace::<f64>::with_uniform_grid(3, 4);
    let space = TensorProductSpace::new(vec![v1, v2]);
    let mut rhs = StencilVector::zeros(space.vector_space());
    assemble_rhs_2d(
        &space,
        |x, y| 2.0 * PI * PI * (PI * x).sin() * (PI * y).sin(),
        &mut rhs,
    )
    .unwrap();

    let npts = space.vector_space().npts().to_vec();
    for i1 in 1..npts[0] as isize - 1 {
        for i2 in 1..npts[1] as isize - 1 {
            assert!(rhs.get(&[i1, i2]) > 0.0);
        }
    }
}
