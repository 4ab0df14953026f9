use rand::Rng;

/// Characters a target sequence is drawn from
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a sequence of pairwise-distinct characters from [`ALPHABET`].
///
/// Characters are drawn without replacement, uniformly over what is left in
/// the pool. Asking for more characters than the alphabet holds returns the
/// whole (shuffled) alphabet instead of failing.
pub fn generate<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    let mut pool: Vec<char> = ALPHABET.chars().collect();
    let mut sequence = String::with_capacity(length.min(pool.len()));

    for _ in 0..length {
        if pool.is_empty() {
            break;
        }
        let idx = rng.gen_range(0..pool.len());
        sequence.push(pool.remove(idx));
    }

    sequence
}
