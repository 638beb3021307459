use super::pow_mod;

/// Returns `true` if `root` is a primitive `degree`-th root of unity mod `q`,
/// `degree` a power of two.
pub fn is_primitive_root(root: u64, degree: u64, modulus: u64) -> bool {
    if root == 0 || degree < 2 || !degree.is_power_of_two() {
        return false;
    }
    // For a power-of-two order it suffices that root^(degree/2) = -1.
    pow_mod(root, degree >> 1, modulus) == modulus - 1
}

/// Smallest primitive `degree`-th root of unity mod the prime `q`.
///
/// Takes the first primitive root of the form `x^((q-1)/degree)` for
/// `x = 2, 3, ...` and returns the minimum among its odd powers, which are
/// exactly the primitive roots of that order.
pub fn minimal_primitive_root(degree: u64, modulus: u64) -> Option<u64> {
    if degree < 2 || !degree.is_power_of_two() || modulus <= 2 || (modulus - 1) % degree != 0 {
        return None;
    }

    let cofactor: u64 = (modulus - 1) / degree;
    let root: u64 = (2..modulus)
        .map(|x| pow_mod(x, cofactor, modulus))
        .find(|&r| is_primitive_root(r, degree, modulus))?;

    let root_sq: u64 = super::multiply_mod(root, root, modulus);
    let mut current: u64 = root;
    let mut minimal: u64 = root;
    for _ in 0..degree >> 1 {
        minimal = minimal.min(current);
        current = super::multiply_mod(current, root_sq, modulus);
    }
    Some(minimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_root_769() {
        // 769 = 3 * 2^8 + 1
        let root: u64 = minimal_primitive_root(16, 769).unwrap();
        assert!(is_primitive_root(root, 16, 769));
        assert_eq!(pow_mod(root, 16, 769), 1);
        (1..769u64)
            .filter(|&r| is_primitive_root(r, 16, 769))
            .for_each(|r| assert!(root <= r));
    }

    #[test]
    fn rejects() {
        assert!(!is_primitive_root(1, 16, 769));
        assert!(!is_primitive_root(0, 16, 769));
        assert!(!is_primitive_root(3, 12, 769));
        assert_eq!(minimal_primitive_root(1024, 769), None);
        assert_eq!(minimal_primitive_root(12, 769), None);
    }

    #[test]
    fn large_modulus() {
        let q: u64 = 0xffffffffffc0001;
        let degree: u64 = 1 << 15;
        let root: u64 = minimal_primitive_root(degree, q).unwrap();
        assert!(is_primitive_root(root, degree, q));
    }
}
