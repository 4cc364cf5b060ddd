use alloy::primitives::{keccak256, Bytes, B256};

/// Hash two sibling nodes. The pair is sorted byte-wise before hashing, so
/// the parent does not depend on which side each child sits.
pub fn hash_sorted_pair(a: &[u8], b: &[u8]) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = Vec::with_capacity(lo.len() + hi.len());
    buf.extend_from_slice(lo);
    buf.extend_from_slice(hi);
    keccak256(buf)
}

/// Binary Merkle tree with Keccak-256 and sorted sibling pairs.
///
/// Leaves are stored as provided. When a layer has an odd number of nodes the
/// last one is promoted to the next layer unchanged.
#[derive(Debug, Clone)]
pub struct SortedKeccakTree {
    /// `layers[0]` holds the leaves, the last layer holds the root.
    layers: Vec<Vec<Bytes>>,
}

impl SortedKeccakTree {
    pub fn new(leaves: Vec<Bytes>) -> Self {
        let mut layers = vec![leaves];
        while layers.last().is_some_and(|layer| layer.len() > 1) {
            let below = &layers[layers.len() - 1];
            let next = below
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => Bytes::from(hash_sorted_pair(left, right).to_vec()),
                    [single] => single.clone(),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root node, or `None` for an empty tree. A single-leaf tree's root is the leaf.
    pub fn root(&self) -> Option<&Bytes> {
        self.layers.last().and_then(|layer| layer.first())
    }

    /// Root as a 32-byte word. `None` when empty or when the root is a lone
    /// leaf that is not 32 bytes long.
    pub fn root_b256(&self) -> Option<B256> {
        self.root().and_then(|r| B256::try_from(r.as_ref()).ok())
    }

    /// Sibling path from the leaf at `index` up to the root.
    pub fn proof(&self, index: usize) -> Option<Vec<Bytes>> {
        if index >= self.len() {
            return None;
        }
        let mut path = Vec::new();
        let mut idx = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = idx ^ 1;
            if sibling < layer.len() {
                path.push(layer[sibling].clone());
            }
            idx /= 2;
        }
        Some(path)
    }
}

/// Check a sibling path produced by [`SortedKeccakTree::proof`].
pub fn verify_proof(leaf: &[u8], proof: &[Bytes], root: &[u8]) -> bool {
    let mut node = Bytes::copy_from_slice(leaf);
    for sibling in proof {
        node = Bytes::from(hash_sorted_pair(&node, sibling).to_vec());
    }
    node.as_ref() == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> Bytes {
        Bytes::from(B256::repeat_byte(byte).to_vec())
    }

    fn leaves(n: u8) -> Vec<Bytes> {
        (1..=n).map(leaf).collect()
    }

    #[test]
    fn test_empty_tree_has_no_root() {
        let tree = SortedKeccakTree::new(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert!(tree.proof(0).is_none());
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tree = SortedKeccakTree::new(vec![leaf(7)]);
        assert_eq!(tree.root(), Some(&leaf(7)));
        assert!(tree.proof(0).unwrap().is_empty());
    }

    #[test]
    fn test_two_leaves_hash_sorted_concat() {
        let a = leaf(0x02);
        let b = leaf(0x01);
        let tree = SortedKeccakTree::new(vec![a.clone(), b.clone()]);

        let mut concat = b.to_vec();
        concat.extend_from_slice(&a);
        assert_eq!(tree.root_b256(), Some(keccak256(concat)));
    }

    #[test]
    fn test_every_proof_verifies() {
        let tree = SortedKeccakTree::new(leaves(8));
        let root = tree.root().unwrap().clone();

        for (i, l) in leaves(8).iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.len(), 3, "depth of an 8-leaf tree");
            assert!(verify_proof(l, &proof, &root), "leaf {i} should verify");
        }
    }

    #[test]
    fn test_wrong_leaf_rejected() {
        let tree = SortedKeccakTree::new(leaves(8));
        let root = tree.root().unwrap().clone();
        let proof = tree.proof(0).unwrap();
        assert!(!verify_proof(&leaf(0xEE), &proof, &root));
    }

    #[test]
    fn test_odd_layer_promotes_last_node() {
        let tree = SortedKeccakTree::new(leaves(3));
        let root = tree.root().unwrap().clone();

        // Leaf 2 has no sibling at the bottom layer.
        let proof = tree.proof(2).unwrap();
        assert_eq!(proof.len(), 1);
        assert!(verify_proof(&leaf(3), &proof, &root));

        let left = hash_sorted_pair(&leaf(1), &leaf(2));
        assert_eq!(tree.root_b256(), Some(hash_sorted_pair(left.as_slice(), &leaf(3))));
    }

    #[test]
    fn test_sibling_swap_keeps_root() {
        let original = SortedKeccakTree::new(leaves(8));
        let mut swapped = leaves(8);
        swapped.swap(0, 1);
        swapped.swap(6, 7);
        assert_eq!(original.root(), SortedKeccakTree::new(swapped).root());
    }

    #[test]
    fn test_subtree_swap_keeps_root() {
        let original = SortedKeccakTree::new(leaves(8));
        let mut swapped = leaves(8);
        swapped.rotate_left(4);
        assert_eq!(original.root(), SortedKeccakTree::new(swapped).root());
    }

    // Reference roots computed with merkletreejs `sortPairs: true` over raw leaves.
    #[test]
    fn test_matches_merkletreejs_sorted_root() {
        let leaves: Vec<Bytes> = (1..=8u8)
            .map(|i| Bytes::from(B256::with_last_byte(i).to_vec()))
            .collect();
        let tree = SortedKeccakTree::new(leaves.clone());
        assert_eq!(
            hex::encode(tree.root().unwrap()),
            "ca06f8324669a77a3ef9a7bcf15421d7bb5618a79dbe5590117ba5f5a4e72bc1"
        );

        let odd = SortedKeccakTree::new(leaves[..3].to_vec());
        assert_eq!(
            hex::encode(odd.root().unwrap()),
            "9b0225f2c6f59eeaf8302811ea290e95258763189b82dc033158e99a6ef45a87"
        );
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = SortedKeccakTree::new(leaves(4));
        assert!(tree.proof(4).is_none());
    }
}
