use crate::config::Material;
use crate::error::{BeamSimError, SimResult};
use crate::geometry::{BeamCase, LoadRegion};
use crate::mesh::{Face, HexMesh};

/// Writes CalculiX input decks for meshed beam cases
pub struct DeckGenerator {
    material: Material,
}

impl DeckGenerator {
    /// Ids per line in `*NSET` data lines (CalculiX accepts at most 16)
    const IDS_PER_LINE: usize = 16;

    pub fn new(material: Material) -> Self {
        Self { material }
    }

    /// Faces receiving the case pressure
    pub fn loaded_faces(case: &BeamCase, mesh: &HexMesh) -> Vec<(usize, Face)> {
        match case.shape.load_region() {
            LoadRegion::Plane(axis, value) => mesh.faces_on_plane(axis, value),
            LoadRegion::Exterior => mesh.exterior_faces(),
        }
    }

    pub fn generate_inp_file(&self, case: &BeamCase, mesh: &HexMesh) -> SimResult<String> {
        let mut inp = String::new();

        let (support_axis, support_value) = case.shape.support_plane();
        let fixed = mesh.nodes_on_plane(support_axis, support_value);
        if fixed.is_empty() {
            return Err(BeamSimError::Generation(format!(
                "no nodes on support plane {}={}",
                support_axis.as_str(),
                support_value
            )));
        }

        let loaded = Self::loaded_faces(case, mesh);
        if loaded.is_empty() {
            return Err(BeamSimError::Generation("no faces to load".to_string()));
        }

        // 1. Header
        inp.push_str("*HEADING\n");
        inp.push_str(&format!(
            "{} beam, pressure {:.6e} Pa\n",
            case.shape.name(),
            case.pressure
        ));

        // 2. Nodes (CalculiX uses 1-based ids)
        inp.push_str("*NODE, NSET=NALL\n");
        for (idx, p) in mesh.nodes().iter().enumerate() {
            inp.push_str(&format!(
                "{}, {:.9e}, {:.9e}, {:.9e}\n",
                idx + 1,
                p[0],
                p[1],
                p[2]
            ));
        }

        // 3. Elements: 8-node linear bricks
        inp.push_str("*ELEMENT, TYPE=C3D8, ELSET=EALL\n");
        for (idx, e) in mesh.elements().iter().enumerate() {
            let ids: Vec<String> = e.iter().map(|n| (n + 1).to_string()).collect();
            inp.push_str(&format!("{}, {}\n", idx + 1, ids.join(", ")));
        }

        // 4. Support node set
        inp.push_str("*NSET, NSET=NFIX\n");
        for chunk in fixed.chunks(Self::IDS_PER_LINE) {
            let ids: Vec<String> = chunk.iter().map(|n| (n + 1).to_string()).collect();
            inp.push_str(&format!("{},\n", ids.join(", ")));
        }

        // 5. Material and section
        let material_name = self.material.name.to_uppercase();
        inp.push_str(&format!("*MATERIAL, NAME={}\n", material_name));
        inp.push_str("*ELASTIC\n");
        inp.push_str(&format!(
            "{:.6e}, {:.4}\n",
            self.material.elastic_modulus, self.material.poisson_ratio
        ));
        inp.push_str(&format!(
            "*SOLID SECTION, ELSET=EALL, MATERIAL={}\n",
            material_name
        ));

        // 6. Boundary conditions: fixed translations
        inp.push_str("*BOUNDARY\n");
        inp.push_str("NFIX, 1, 3, 0.0\n");

        // 7. Step and surface pressure
        inp.push_str("*STEP\n");
        inp.push_str("*STATIC\n");
        inp.push_str("*DLOAD\n");
        for (elem, face) in &loaded {
            inp.push_str(&format!(
                "{}, P{}, {:.6e}\n",
                elem + 1,
                face.number(),
                case.pressure
            ));
        }

        // 8. Output requests: nodal displacements and extrapolated stresses in the .frd
        inp.push_str("*NODE FILE\n");
        inp.push_str("U\n");
        inp.push_str("*EL FILE\n");
        inp.push_str("S\n");

        inp.push_str("*END STEP\n");

        tracing::debug!(
            "Generated deck: {} nodes, {} elements, {} fixed nodes, {} loaded faces",
            mesh.node_count(),
            mesh.element_count(),
            fixed.len(),
            loaded.len()
        );

        Ok(inp)
    }
}
